mod tests {
    use embassy_time::Duration;
    use myrtio_cam_trigger::{
        CamTrigger, CamTriggerSetup, CameraAction, ConfigError, DayNight, LightGate, PinLevels,
        PirSenseConfig, PirSenseSettings, ProgramTag, SourceConfig, TickRate, TriggerCommand,
        TriggerConfig, TriggerMode, TriggerState, TriggerTimings,
    };

    const PIR_SETTINGS: PirSenseSettings = PirSenseSettings {
        interval: Duration::from_millis(50),
        threshold: 600,
    };

    fn setup() -> CamTriggerSetup {
        // One tick per millisecond
        CamTriggerSetup {
            pin_count: 2,
            rate: TickRate::new(1000),
            timings: TriggerTimings::default(),
        }
    }

    fn source(action: CameraAction) -> SourceConfig {
        SourceConfig {
            action,
            inter_trigger: Duration::from_millis(5000),
            light_gate: LightGate::new(DayNight::Day, 10),
        }
    }

    fn config(mode: TriggerMode, pir: CameraAction, timer: CameraAction) -> TriggerConfig {
        TriggerConfig {
            mode,
            pir: source(pir),
            pir_sense: PirSenseConfig {
                threshold: 75,
                amplification: 30,
            },
            timer: source(timer),
            timer_interval: Duration::from_millis(10_000),
        }
    }

    fn started(config: &TriggerConfig) -> CamTrigger {
        let mut trigger = CamTrigger::new(config, &setup()).unwrap();
        let _ = trigger.start();
        trigger
    }

    /// Completion of the program the trigger started last
    fn done(trigger: &CamTrigger, state: TriggerState) -> ProgramTag {
        ProgramTag {
            state,
            generation: trigger.generation(),
        }
    }

    fn durations(commands: &myrtio_cam_trigger::TriggerCommands) -> Vec<u32> {
        commands
            .started_program()
            .unwrap()
            .transitions()
            .iter()
            .map(|t| t.duration)
            .collect()
    }

    #[test]
    fn test_new_validates() {
        let config = config(TriggerMode::PirOnly, CameraAction::SingleShot, CameraAction::Focus);
        let setup = CamTriggerSetup {
            pin_count: 3,
            ..setup()
        };
        assert_eq!(
            CamTrigger::new(&config, &setup).err(),
            Some(ConfigError::PinCount {
                expected: 2,
                actual: 3
            })
        );

        let burst = CameraAction::MultiShot { gap: 10, count: 0 };
        let config = self::config(TriggerMode::PirOnly, burst, CameraAction::Focus);
        assert_eq!(
            CamTrigger::new(&config, &self::setup()).err(),
            Some(ConfigError::BurstCount(0))
        );
    }

    #[test]
    fn test_init() {
        let config = config(TriggerMode::PirOnly, CameraAction::SingleShot, CameraAction::Focus);
        let trigger = CamTrigger::new(&config, &setup()).unwrap();
        assert_eq!(
            trigger.init().as_slice(),
            [
                TriggerCommand::SetAmplification(30),
                TriggerCommand::StopPattern(PinLevels::ALL_ON),
            ]
        );
        assert!(!trigger.is_started());

        let config = self::config(TriggerMode::TimerOnly, CameraAction::SingleShot, CameraAction::Focus);
        let trigger = CamTrigger::new(&config, &self::setup()).unwrap();
        assert_eq!(
            trigger.init().as_slice(),
            [TriggerCommand::StopPattern(PinLevels::ALL_ON)]
        );
    }

    #[test]
    fn test_start_is_idempotent() {
        let config = config(
            TriggerMode::PirAndTimer,
            CameraAction::SingleShot,
            CameraAction::Focus,
        );
        let mut trigger = CamTrigger::new(&config, &setup()).unwrap();
        assert_eq!(
            trigger.start().as_slice(),
            [
                TriggerCommand::StartTimer(Duration::from_millis(10_000)),
                TriggerCommand::EnablePir(PIR_SETTINGS),
            ]
        );
        assert!(trigger.start().is_empty());
        assert!(trigger.is_started());
    }

    #[test]
    fn test_stop_forces_safe_levels() {
        let config = config(
            TriggerMode::PirAndTimer,
            CameraAction::SingleShot,
            CameraAction::Focus,
        );
        let mut trigger = started(&config);
        let _ = trigger.on_pir(0);

        assert_eq!(
            trigger.stop().as_slice(),
            [
                TriggerCommand::DisablePir,
                TriggerCommand::StopTimer,
                TriggerCommand::StopPattern(PinLevels::ALL_ON),
            ]
        );
        assert!(!trigger.is_started());
        assert!(!trigger.is_pir_operation());
        assert_eq!(trigger.time_remaining(), 0);
    }

    #[test]
    fn test_short_ticks_are_ignored() {
        let config = config(TriggerMode::PirOnly, CameraAction::SingleShot, CameraAction::Focus);
        let mut trigger = CamTrigger::new(&config, &setup()).unwrap();

        assert!(trigger.add_tick(10, 1000).is_empty());
        assert!(trigger.add_tick(51, 1000).is_empty());
        assert!(!trigger.is_started());

        assert!(!trigger.add_tick(52, 1000).is_empty());
        assert!(trigger.is_started());

        // Dark, but the tick is too short to act on
        assert!(trigger.add_tick(10, 0).is_empty());
        assert!(trigger.is_started());
    }

    #[test]
    fn test_tick_follows_light_gate() {
        let config = config(TriggerMode::PirOnly, CameraAction::SingleShot, CameraAction::Focus);
        let mut trigger = CamTrigger::new(&config, &setup()).unwrap();

        assert_eq!(
            trigger.add_tick(1000, 400).as_slice(),
            [TriggerCommand::EnablePir(PIR_SETTINGS)]
        );
        assert!(trigger.add_tick(1000, 400).is_empty());

        let commands = trigger.add_tick(1000, 100);
        assert!(commands.iter().any(|c| *c == TriggerCommand::DisablePir));
        assert!(!trigger.is_started());
    }

    #[test]
    fn test_tick_with_both_sources_needs_either_gate() {
        let mut config = config(
            TriggerMode::PirAndTimer,
            CameraAction::SingleShot,
            CameraAction::Focus,
        );
        config.pir.light_gate = LightGate::new(DayNight::Day, 20);
        config.timer.light_gate = LightGate::new(DayNight::Night, 5);
        let mut trigger = CamTrigger::new(&config, &setup()).unwrap();

        let _ = trigger.add_tick(1000, 100);
        assert!(trigger.is_started());
        let _ = trigger.add_tick(1000, 400);
        assert!(!trigger.is_started());
        let _ = trigger.add_tick(1000, 700);
        assert!(trigger.is_started());
    }

    #[test]
    fn test_events_ignored_while_stopped() {
        let config = config(
            TriggerMode::PirAndTimer,
            CameraAction::SingleShot,
            CameraAction::Focus,
        );
        let mut trigger = CamTrigger::new(&config, &setup()).unwrap();
        assert!(trigger.on_pir(0).is_empty());
        assert!(trigger.on_timer().is_empty());
        assert!(trigger.on_pattern_done(done(&trigger, TriggerState::Idle)).is_empty());
    }

    #[test]
    fn test_pir_single_shot() {
        let config = config(TriggerMode::PirOnly, CameraAction::SingleShot, CameraAction::Focus);
        let mut trigger = started(&config);

        let commands = trigger.on_pir(0);
        assert_eq!(commands.len(), 3);
        assert_eq!(commands.as_slice()[0], TriggerCommand::DisablePir);
        assert_eq!(
            commands.as_slice()[1],
            TriggerCommand::StopPattern(PinLevels::ALL_ON)
        );
        let press = commands.started_program().unwrap();
        assert_eq!(press.state(), TriggerState::Photo);
        assert_eq!(press.generation(), trigger.generation());
        assert_eq!(durations(&commands), [250]);
        assert_eq!(trigger.time_remaining(), 4740);
        assert!(trigger.is_pir_operation());

        // Settle and the rest of the interval follow the press
        let commands = trigger.on_pattern_done(done(&trigger, TriggerState::Photo));
        assert_eq!(commands.len(), 1);
        assert_eq!(
            commands.started_program().unwrap().state(),
            TriggerState::Idle
        );
        assert_eq!(durations(&commands), [10, 4740]);
        assert_eq!(trigger.time_remaining(), 0);
        assert!(trigger.is_pir_operation());

        assert_eq!(
            trigger.on_pattern_done(done(&trigger, TriggerState::Idle)).as_slice(),
            [TriggerCommand::EnablePir(PIR_SETTINGS)]
        );
        assert!(!trigger.is_pir_operation());
    }

    #[test]
    fn test_replaced_program_completion_is_ignored() {
        let config = config(
            TriggerMode::PirAndTimer,
            CameraAction::MultiShot { gap: 5, count: 2 },
            CameraAction::Focus,
        );
        let mut trigger = started(&config);

        let _ = trigger.on_timer();
        let timer_done = done(&trigger, TriggerState::Idle);

        let _ = trigger.on_pir(100);
        assert!(trigger.on_pattern_done(timer_done).is_empty());
        assert!(trigger.is_pir_operation());
        assert!(trigger.on_timer().is_empty());

        assert_eq!(
            trigger.on_pattern_done(done(&trigger, TriggerState::Idle)).as_slice(),
            [TriggerCommand::EnablePir(PIR_SETTINGS)]
        );
        assert!(!trigger.is_pir_operation());
    }

    #[test]
    fn test_stop_makes_pending_completion_stale() {
        let config = config(TriggerMode::PirOnly, CameraAction::SingleShot, CameraAction::Focus);
        let mut trigger = started(&config);
        let _ = trigger.on_pir(0);
        let pending = done(&trigger, TriggerState::Photo);

        let _ = trigger.stop();
        let _ = trigger.start();
        assert!(trigger.on_pattern_done(pending).is_empty());
    }

    #[test]
    fn test_timer_waits_for_pir_operation() {
        let config = config(
            TriggerMode::PirAndTimer,
            CameraAction::SingleShot,
            CameraAction::Focus,
        );
        let mut trigger = started(&config);

        let _ = trigger.on_pir(0);
        assert!(trigger.on_timer().is_empty());

        let _ = trigger.on_pattern_done(done(&trigger, TriggerState::Photo));
        assert!(trigger.on_timer().is_empty());

        let _ = trigger.on_pattern_done(done(&trigger, TriggerState::Idle));
        let commands = trigger.on_timer();
        assert_eq!(
            commands.as_slice()[0],
            TriggerCommand::StopPattern(PinLevels::ALL_ON)
        );
        let program = commands.started_program().unwrap();
        assert_eq!(program.transitions()[0].levels, PinLevels::PRESS_FOCUS);
        assert_eq!(program.total_ticks(), 5000);
    }

    #[test]
    fn test_pir_video_with_extension() {
        let mut config = config(
            TriggerMode::PirOnly,
            CameraAction::Video { duration: 50 },
            CameraAction::Focus,
        );
        config.pir.inter_trigger = Duration::from_millis(2000);
        let mut trigger = started(&config);

        let commands = trigger.on_pir(0);
        let program = commands.started_program().unwrap();
        assert_eq!(program.state(), TriggerState::VideoStart);
        assert_eq!(durations(&commands), [250, 3000]);
        assert_eq!(trigger.video_extension(), 2000);
        assert_eq!(trigger.time_remaining(), 2000);

        let commands = trigger.on_pattern_done(done(&trigger, TriggerState::VideoStart));
        assert_eq!(
            commands.as_slice()[0],
            TriggerCommand::EnablePir(PIR_SETTINGS)
        );
        assert_eq!(
            commands.started_program().unwrap().state(),
            TriggerState::VideoEnd
        );
        assert_eq!(durations(&commands), [2000, 250]);
        assert!(trigger.is_video_on());

        // Motion while recording extends the video
        let commands = trigger.on_pir(500);
        assert_eq!(commands.as_slice()[0], TriggerCommand::DisablePir);
        assert_eq!(
            commands.started_program().unwrap().state(),
            TriggerState::VideoExt
        );
        assert_eq!(durations(&commands), [2000]);
        assert_eq!(trigger.time_remaining(), 1500);

        let commands = trigger.on_pattern_done(done(&trigger, TriggerState::VideoExt));
        assert_eq!(durations(&commands), [1500, 250]);
        assert_eq!(
            commands.as_slice()[1],
            TriggerCommand::EnablePir(PIR_SETTINGS)
        );

        assert_eq!(
            trigger.on_pattern_done(done(&trigger, TriggerState::VideoEnd)).as_slice(),
            [TriggerCommand::EnablePir(PIR_SETTINGS)]
        );
        assert!(!trigger.is_video_on());
        assert!(!trigger.is_pir_operation());
        assert_eq!(trigger.time_remaining(), 0);
    }

    #[test]
    fn test_video_extension_saturates() {
        let mut config = config(
            TriggerMode::PirOnly,
            CameraAction::Video { duration: 50 },
            CameraAction::Focus,
        );
        config.pir.inter_trigger = Duration::from_millis(2000);
        let mut trigger = started(&config);

        let _ = trigger.on_pir(0);
        let _ = trigger.on_pattern_done(done(&trigger, TriggerState::VideoStart));
        let _ = trigger.on_pir(5000);
        assert_eq!(trigger.time_remaining(), 0);

        let commands = trigger.on_pattern_done(done(&trigger, TriggerState::VideoExt));
        assert_eq!(durations(&commands), [0, 250]);
    }

    #[test]
    fn test_video_extension_capped_by_length() {
        let config = config(
            TriggerMode::PirOnly,
            CameraAction::Video { duration: 20 },
            CameraAction::Focus,
        );
        let mut trigger = started(&config);

        let commands = trigger.on_pir(0);
        assert_eq!(trigger.video_extension(), 2000);
        assert_eq!(durations(&commands), [250, 0]);
    }

    #[test]
    fn test_timer_video() {
        let config = config(
            TriggerMode::TimerOnly,
            CameraAction::SingleShot,
            CameraAction::Video { duration: 10 },
        );
        let mut trigger = started(&config);

        let commands = trigger.on_timer();
        let program = commands.started_program().unwrap();
        assert_eq!(program.state(), TriggerState::VideoTimer);
        assert_eq!(durations(&commands), [250, 1000, 250, 3500]);

        // No PIR to re-arm in timer only mode
        assert!(trigger.on_pattern_done(done(&trigger, TriggerState::VideoTimer)).is_empty());
        assert!(!trigger.is_video_on());
    }

    #[test]
    fn test_update() {
        let config = config(TriggerMode::PirOnly, CameraAction::SingleShot, CameraAction::Focus);
        let mut trigger = started(&config);

        let mut next = config;
        next.pir_sense.amplification = 40;
        assert_eq!(
            trigger.update(&next).unwrap().as_slice(),
            [TriggerCommand::SetAmplification(40)]
        );
        assert!(trigger.is_started());

        let mut invalid = next;
        invalid.pir.action = CameraAction::MultiShot { gap: 10, count: 17 };
        assert_eq!(trigger.update(&invalid).err(), Some(ConfigError::BurstCount(17)));
        assert_eq!(trigger.config(), &next);
    }
}
