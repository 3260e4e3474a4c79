//! Layer indicator feedback.
use sweep_types::indicator::{Hsv, LayerIndicator};

use crate::Runnable;
use crate::channel::CONTROLLER_CHANNEL;
use crate::config::IndicatorConfig;
use crate::event::ControllerEvent;

/// The indicator for the highest active layer
pub fn layer_indicator(config: &IndicatorConfig, highest_layer: u8) -> LayerIndicator {
    if config.mouse_layer == Some(highest_layer) {
        LayerIndicator::Mouse
    } else if config.function_layer == Some(highest_layer) {
        LayerIndicator::Function
    } else {
        LayerIndicator::Off
    }
}

/// RGB hardware which shows the indicator
pub trait IndicatorDriver {
    async fn set_hsv(&mut self, hsv: Hsv);
}

/// Drives an [`IndicatorDriver`] from the controller events of the keyboard
pub struct IndicatorController<D: IndicatorDriver> {
    driver: D,
    value: u8,
}

impl<D: IndicatorDriver> IndicatorController<D> {
    pub fn new(driver: D, config: &IndicatorConfig) -> Self {
        Self {
            driver,
            value: config.value,
        }
    }

    pub async fn process_event(&mut self, event: ControllerEvent) {
        if let ControllerEvent::Indicator(indicator) = event {
            debug!("Indicator: {:?}", indicator);
            self.driver.set_hsv(indicator.hsv(self.value)).await;
        }
    }
}

impl<D: IndicatorDriver> Runnable for IndicatorController<D> {
    async fn run(&mut self) -> ! {
        // Start dark, like the base layer
        self.driver.set_hsv(Hsv::BLACK).await;
        loop {
            let event = CONTROLLER_CHANNEL.receive().await;
            self.process_event(event).await;
        }
    }
}

#[cfg(test)]
mod test {
    use embassy_futures::block_on;

    use super::*;

    #[derive(Default)]
    struct RecordingDriver(Vec<Hsv>);

    impl IndicatorDriver for RecordingDriver {
        async fn set_hsv(&mut self, hsv: Hsv) {
            self.0.push(hsv);
        }
    }

    fn config() -> IndicatorConfig {
        IndicatorConfig {
            mouse_layer: Some(5),
            function_layer: Some(4),
            value: 32,
        }
    }

    #[test]
    fn test_layer_indicator() {
        let config = config();
        assert_eq!(layer_indicator(&config, 0), LayerIndicator::Off);
        assert_eq!(layer_indicator(&config, 3), LayerIndicator::Off);
        assert_eq!(layer_indicator(&config, 4), LayerIndicator::Function);
        assert_eq!(layer_indicator(&config, 5), LayerIndicator::Mouse);
        assert_eq!(layer_indicator(&IndicatorConfig::default(), 5), LayerIndicator::Off);
    }

    #[test]
    fn test_controller_colours() {
        let mut controller = IndicatorController::new(RecordingDriver::default(), &config());
        block_on(async {
            controller.process_event(ControllerEvent::Indicator(LayerIndicator::Mouse)).await;
            controller.process_event(ControllerEvent::Layer(5, true)).await;
            controller.process_event(ControllerEvent::Indicator(LayerIndicator::Function)).await;
            controller.process_event(ControllerEvent::Indicator(LayerIndicator::Off)).await;
        });
        assert_eq!(
            controller.driver.0,
            [Hsv::new(170, 255, 32), Hsv::new(234, 128, 32), Hsv::BLACK]
        );
    }
}
