mod tests {
    use embassy_time::Duration;
    use myrtio_cam_trigger::detector::{SENSE_FAST_TICK_INTERVAL, SYNC_REST};
    use myrtio_cam_trigger::{
        CamTriggerSetup, CamUnit, CameraAction, DayNight, DetectMode, DetectorConfig,
        DetectorEvent, DetectorHardware, DetectorRunner, DeviceTick, EventQueue,
        FeedbackIndicator, IntervalTimer, LightGate, LightSensor, MotionDetector, MotionState,
        OpticalDetector, PatternOutput, PatternProgram, PinLevels, SourceConfig, TickRate,
        TickSpeed, TimerMode, TriggerState, TriggerTimings,
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Listening {
        Off,
        Window,
        Pulse,
    }

    struct MockDetector {
        mode: Listening,
        window: Option<Duration>,
    }

    impl OpticalDetector for MockDetector {
        fn set_window(&mut self, window: Duration) {
            self.window = Some(window);
        }

        fn start_window_detect(&mut self) {
            self.mode = Listening::Window;
        }

        fn start_pulse_detect(&mut self) {
            self.mode = Listening::Pulse;
        }

        fn stop(&mut self) {
            self.mode = Listening::Off;
        }
    }

    #[derive(Default)]
    struct MockTimer {
        running: Option<(Duration, TimerMode)>,
    }

    impl IntervalTimer for MockTimer {
        fn start(&mut self, period: Duration, mode: TimerMode) {
            self.running = Some((period, mode));
        }

        fn stop(&mut self) {
            self.running = None;
        }
    }

    #[derive(Default)]
    struct MockOutput {
        started: Vec<PatternProgram>,
        stopped: Vec<PinLevels>,
    }

    impl PatternOutput for MockOutput {
        fn start(&mut self, program: &PatternProgram) {
            self.started.push(program.clone());
        }

        fn stop(&mut self, levels: PinLevels) {
            self.stopped.push(levels);
        }

    }

    impl MockOutput {
        /// Completion the generator interrupt raises for the last program
        fn finish(&self) -> DetectorEvent {
            DetectorEvent::PatternDone(self.started.last().unwrap().tag())
        }
    }

    #[derive(Default)]
    struct MockTick {
        speed: Option<TickSpeed>,
        processed: usize,
    }

    impl DeviceTick for MockTick {
        fn set_speed(&mut self, speed: TickSpeed) {
            self.speed = Some(speed);
        }

        fn process(&mut self) {
            self.processed += 1;
        }
    }

    struct MockLight(u32);

    impl LightSensor for MockLight {
        fn read(&mut self) -> u32 {
            self.0
        }
    }

    #[derive(Default)]
    struct MockFeedback {
        on: bool,
    }

    impl FeedbackIndicator for MockFeedback {
        fn set(&mut self, on: bool) {
            self.on = on;
        }
    }

    type Hardware =
        DetectorHardware<MockDetector, MockTimer, MockOutput, MockTick, MockLight, MockFeedback>;
    type Runner<'a> = DetectorRunner<
        'a,
        MockDetector,
        MockTimer,
        MockOutput,
        MockTick,
        MockLight,
        MockFeedback,
        8,
    >;

    fn hardware() -> Hardware {
        DetectorHardware {
            detector: MockDetector {
                mode: Listening::Off,
                window: None,
            },
            trigger_timer: MockTimer::default(),
            sync_timer: MockTimer::default(),
            output: MockOutput::default(),
            tick: MockTick::default(),
            light: MockLight(400),
            feedback: MockFeedback::default(),
        }
    }

    fn runner(queue: &EventQueue<DetectorEvent, 8>, mode: DetectMode) -> Runner<'_> {
        let motion = SourceConfig {
            action: CameraAction::SingleShot,
            inter_trigger: Duration::from_millis(5000),
            light_gate: LightGate::new(DayNight::Day, 10),
        };
        let config = DetectorConfig {
            mode,
            motion,
            detect_window: Duration::from_millis(100),
            timer: SourceConfig {
                action: CameraAction::Focus,
                ..motion
            },
            timer_interval: Duration::from_millis(10_000),
        };
        let setup = CamTriggerSetup {
            pin_count: 2,
            rate: TickRate::new(1000),
            timings: TriggerTimings::default(),
        };
        let core = MotionDetector::new(&config, setup.rate).unwrap();
        let camera = CamUnit::new(&setup).unwrap();
        DetectorRunner::new(core, camera, hardware(), queue.consumer())
    }

    #[test]
    fn test_start() {
        let queue = EventQueue::new();
        let mut runner = runner(&queue, DetectMode::Both);
        assert_eq!(runner.hardware().output.stopped, [PinLevels::ALL_ON]);

        runner.start();
        let hardware = runner.hardware();
        assert_eq!(hardware.detector.mode, Listening::Window);
        assert_eq!(hardware.detector.window, Some(Duration::from_millis(100)));
        assert_eq!(hardware.tick.speed, Some(TickSpeed::Slow));
        assert_eq!(
            hardware.trigger_timer.running,
            Some((Duration::from_millis(10_000), TimerMode::Repeated))
        );
        assert!(hardware.sync_timer.running.is_none());
    }

    #[test]
    fn test_motion_runs_photo_then_resumes_detection() {
        let queue = EventQueue::new();
        let mut runner = runner(&queue, DetectMode::MotionOnly);
        runner.start();

        queue.push(DetectorEvent::WindowMissed).unwrap();
        assert_eq!(runner.process_pending(), 1);
        assert_eq!(runner.hardware().detector.mode, Listening::Pulse);
        assert!(runner.core().is_camera_busy());
        let press = runner.hardware().output.started.last().unwrap();
        assert_eq!(press.state(), TriggerState::Photo);

        let done = runner.hardware().output.finish();
        runner.handle(done);
        let settle = runner.hardware().output.started.last().unwrap();
        assert_eq!(settle.state(), TriggerState::Idle);
        assert!(runner.core().is_camera_busy());

        let done = runner.hardware().output.finish();
        runner.handle(done);
        assert!(!runner.core().is_camera_busy());
        assert!(!runner.camera().is_on());
        assert_eq!(runner.hardware().detector.mode, Listening::Window);
    }

    #[test]
    fn test_completion_of_replaced_trigger_is_ignored() {
        let queue = EventQueue::new();
        let mut runner = runner(&queue, DetectMode::Both);
        runner.start();

        runner.handle(DetectorEvent::TimerElapsed);
        let timer_done = runner.hardware().output.finish();

        // Motion preempts the timer program before its completion drains
        queue.push(DetectorEvent::WindowMissed).unwrap();
        queue.push(timer_done).unwrap();
        assert_eq!(runner.process_pending(), 2);
        assert!(runner.core().is_camera_busy());
        assert!(runner.camera().is_on());
        assert_eq!(runner.hardware().detector.mode, Listening::Pulse);

        runner.handle(DetectorEvent::TimerElapsed);
        assert_eq!(runner.hardware().output.started.len(), 2);
        let press = runner.hardware().output.started.last().unwrap();
        assert_eq!(press.state(), TriggerState::Photo);

        for _ in 0..2 {
            let done = runner.hardware().output.finish();
            runner.handle(done);
        }
        assert!(!runner.core().is_camera_busy());
        assert_eq!(runner.hardware().detector.mode, Listening::Window);
    }

    #[test]
    fn test_unconfigured_timer_completes_at_once() {
        let queue = EventQueue::new();
        let mut runner = runner(&queue, DetectMode::MotionOnly);
        runner.start();

        runner.handle(DetectorEvent::TimerElapsed);
        assert!(!runner.core().is_camera_busy());
        assert!(runner.hardware().output.started.is_empty());
    }

    #[test]
    fn test_feedback_indicator() {
        let queue = EventQueue::new();
        let mut runner = runner(&queue, DetectMode::MotionOnly);
        runner.start();

        runner.handle(DetectorEvent::PulseDetected);
        assert!(runner.hardware().feedback.on);

        runner.add_tick(600_000);
        assert!(!runner.hardware().feedback.on);
        assert_eq!(runner.core().state(), MotionState::Idle);
    }

    #[test]
    fn test_resync_uses_single_shot_timer() {
        let queue = EventQueue::new();
        let mut runner = runner(&queue, DetectMode::MotionOnly);
        runner.start();
        runner.add_tick(600_000);

        runner.handle(DetectorEvent::WindowMissed);
        assert_eq!(runner.hardware().tick.speed, Some(TickSpeed::Fast));
        for _ in 0..2 {
            let done = runner.hardware().output.finish();
            runner.handle(done);
        }
        assert_eq!(runner.hardware().tick.processed, 1);

        let fast = SENSE_FAST_TICK_INTERVAL.as_millis() as u32;
        for _ in 0..30 {
            runner.add_tick(fast);
        }
        assert_eq!(runner.core().state(), MotionState::Sync);
        assert_eq!(runner.hardware().tick.speed, Some(TickSpeed::Slow));

        runner.add_tick(fast);
        assert_eq!(
            runner.hardware().sync_timer.running,
            Some((SYNC_REST, TimerMode::Single))
        );

        runner.handle(DetectorEvent::SyncTimerElapsed);
        assert_eq!(runner.hardware().detector.mode, Listening::Pulse);
        runner.handle(DetectorEvent::PulseDetected);
        assert!(runner.hardware().sync_timer.running.is_none());
        assert_eq!(runner.core().state(), MotionState::Idle);
    }

    #[test]
    fn test_stop() {
        let queue = EventQueue::new();
        let mut runner = runner(&queue, DetectMode::Both);
        runner.start();
        runner.handle(DetectorEvent::WindowMissed);

        queue.push(runner.hardware().output.finish()).unwrap();
        runner.stop();

        assert!(queue.is_empty());
        let hardware = runner.hardware();
        assert_eq!(hardware.detector.mode, Listening::Off);
        assert!(hardware.trigger_timer.running.is_none());
        assert_eq!(hardware.output.stopped.last(), Some(&PinLevels::ALL_ON));
        assert!(!runner.camera().is_on());
    }
}
