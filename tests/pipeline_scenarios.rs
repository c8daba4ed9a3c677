use std::sync::Arc;
use std::time::Duration;
use strokesense::{
    Actor, Channel, ChannelAvailability, ClassifierKind, MockSensorDriver, PipelineOrchestrator,
    PipelineState, StrokeKind, StrokeSenseConfig, SyntheticSensorDriver,
};

fn config_with_detection(p: f64) -> StrokeSenseConfig {
    let mut config = StrokeSenseConfig::default();
    config.classifier.variant = ClassifierKind::Mock;
    config.classifier.detection_probability = p;
    config.classifier.seed = Some(2024);
    config
}

#[tokio::test(start_paused = true)]
async fn synthetic_sensors_flow_into_events() {
    let driver = Arc::new(SyntheticSensorDriver::new(50, Some(1)));
    let pipeline = PipelineOrchestrator::new(config_with_detection(1.0), driver).unwrap();
    let mut states = pipeline.subscribe_state();
    assert_eq!(states.next().await, Some(PipelineState::Idle));

    pipeline.start(false).await.unwrap();
    assert_eq!(states.next().await, Some(PipelineState::Running));

    tokio::time::sleep(Duration::from_millis(700)).await;

    let event = pipeline.last_event().expect("a stroke should have been detected");
    assert!(event.timestamp > 0);
    assert!((0.5..=1.0).contains(&event.confidence));
    assert!(pipeline.collector().len(Channel::Acceleration) >= 30);
    assert_eq!(pipeline.scheduler_metrics().ticks(), 2);

    pipeline.stop().await;
    assert_eq!(states.next().await, Some(PipelineState::Idle));
    assert!(pipeline.collector().is_empty());

    // Nothing accumulates after stop
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(pipeline.collector().is_empty());
    assert_eq!(pipeline.scheduler_metrics().ticks(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_mode_simulation_bypasses_sensors() {
    let driver = Arc::new(MockSensorDriver::new(ChannelAvailability::none()));
    let pipeline = PipelineOrchestrator::new(config_with_detection(0.0), driver).unwrap();

    assert!(pipeline.start(false).await.is_err());
    assert!(pipeline.state().is_error());

    pipeline.start(true).await.unwrap();
    assert_eq!(pipeline.state(), PipelineState::Running);

    assert!(pipeline.simulate(StrokeKind::Backhand, Actor::B));
    let event = pipeline.last_event().unwrap();
    assert_eq!(event.kind, StrokeKind::Backhand);
    assert_eq!(event.actor, Actor::B);
    assert_eq!(event.confidence, 0.95);
    assert!(pipeline.collector().is_empty());

    pipeline.stop().await;
    assert!(!pipeline.simulate(StrokeKind::Serve, Actor::A));
    assert_eq!(pipeline.last_event().unwrap().kind, StrokeKind::Backhand);
}

#[tokio::test(start_paused = true)]
async fn model_classifier_stays_quiet() {
    let mut config = config_with_detection(1.0);
    config.classifier.variant = ClassifierKind::Model;
    let driver = Arc::new(SyntheticSensorDriver::new(50, Some(3)));
    let pipeline = PipelineOrchestrator::new(config, driver).unwrap();

    pipeline.start(false).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1_000)).await;

    assert_eq!(pipeline.last_event(), None);
    assert_eq!(pipeline.state(), PipelineState::Running);
    pipeline.stop().await;
}
