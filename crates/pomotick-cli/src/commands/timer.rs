use std::sync::Arc;
use std::time::Duration;

use clap::Args;
use pomotick_core::driver;
use pomotick_core::{
    Command, CompletionSignal, Config, CustomTime, DriverError, Event, Mode, Phase, Settings,
    SilentSignal, Snapshot, TimerEngine, TimerHandle,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use crate::render::Renderer;
use crate::signal::DesktopSignal;
use crate::GlobalOpts;

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// How long to wait at exit for desktop notifications still in flight.
const NOTIFY_GRACE: Duration = Duration::from_secs(2);

#[derive(Args)]
pub struct CountdownArgs {
    /// Minutes
    #[arg(allow_negative_numbers = true)]
    minutes: i64,
    /// Seconds
    #[arg(allow_negative_numbers = true, default_value_t = 0)]
    seconds: i64,
}

#[derive(Args)]
pub struct PomodoroArgs {
    /// Work minutes (overrides config)
    #[arg(long)]
    work: Option<u64>,
    /// Short break minutes (overrides config)
    #[arg(long)]
    short_break: Option<u64>,
    /// Long break minutes (overrides config)
    #[arg(long)]
    long_break: Option<u64>,
    /// Work cycles before a long break (overrides config)
    #[arg(long)]
    cycles: Option<u32>,
    /// Stop after this many completed work cycles
    #[arg(long)]
    rounds: Option<u32>,
}

#[derive(Args)]
pub struct InteractiveArgs {
    /// Mode to open in (defaults to config `default_mode`)
    #[arg(long)]
    mode: Option<Mode>,
}

/// When a non-interactive session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    FirstCompletion,
    AfterWorkCycles(u32),
    Never,
}

impl Stop {
    fn reached(&self, event: &Event) -> bool {
        match (self, event) {
            (Stop::FirstCompletion, Event::TimerCompleted { .. }) => true,
            (
                Stop::AfterWorkCycles(rounds),
                Event::TimerCompleted {
                    finished: Phase::Work,
                    completed_work_cycles,
                    ..
                },
            ) => completed_work_cycles >= rounds,
            _ => false,
        }
    }
}

/// Output side of a running driver.
struct Session {
    events: mpsc::UnboundedReceiver<Event>,
    snapshots: watch::Receiver<Snapshot>,
    renderer: Renderer,
    stop: Stop,
}

impl Session {
    fn new(handle: &TimerHandle, events: mpsc::UnboundedReceiver<Event>, opts: &GlobalOpts, stop: Stop) -> Self {
        Self {
            events,
            snapshots: handle.subscribe(),
            renderer: Renderer::new(opts.json),
            stop,
        }
    }

    /// Render the newest snapshot and the events behind it.
    ///
    /// The driver sends events before publishing the snapshot they led to,
    /// so every event for this snapshot is already queued.
    fn flush(&mut self) -> (Snapshot, bool) {
        let snap = *self.snapshots.borrow_and_update();
        self.renderer.snapshot(&snap);
        let mut done = false;
        while let Ok(event) = self.events.try_recv() {
            self.renderer.event(&event);
            done |= self.stop.reached(&event);
        }
        (snap, done)
    }

    /// Follow the timer until the stop condition, driver exit or Ctrl-C.
    async fn follow(&mut self, handle: &TimerHandle) -> CliResult {
        let ctrl_c = tokio::signal::ctrl_c();
        tokio::pin!(ctrl_c);
        loop {
            tokio::select! {
                biased;
                _ = &mut ctrl_c => {
                    handle.pause()?;
                    break;
                }
                changed = self.snapshots.changed() => {
                    if changed.is_err() {
                        break;
                    }
                    let (_, done) = self.flush();
                    if done {
                        break;
                    }
                }
            }
        }
        Ok(())
    }
}

fn tick_period(opts: &GlobalOpts) -> Duration {
    Duration::from_millis(opts.tick_ms.max(1))
}

fn desktop_signal(config: &Config, opts: &GlobalOpts) -> Option<Arc<DesktopSignal>> {
    let notifications = &config.notifications;
    if opts.no_notify || (!notifications.enabled && !notifications.sound) {
        return None;
    }
    Some(Arc::new(DesktopSignal::new(
        notifications.enabled,
        notifications.sound,
        notifications.summary.clone(),
    )))
}

/// A spawned driver plus the desktop signal it raises, if any.
struct Timer {
    handle: TimerHandle,
    events: mpsc::UnboundedReceiver<Event>,
    desktop: Option<Arc<DesktopSignal>>,
}

fn spawn_timer(settings: Settings, config: &Config, opts: &GlobalOpts) -> Timer {
    let desktop = desktop_signal(config, opts);
    let signal: Arc<dyn CompletionSignal> = match &desktop {
        Some(desktop) => desktop.clone(),
        None => Arc::new(SilentSignal),
    };
    let engine = TimerEngine::new(settings, signal);
    let (handle, events) = driver::spawn(engine, tick_period(opts));
    Timer {
        handle,
        events,
        desktop,
    }
}

/// Stop the driver, then let pending notifications reach the desktop.
async fn finish(handle: TimerHandle, desktop: Option<Arc<DesktopSignal>>) -> Result<TimerEngine, DriverError> {
    let engine = handle.shutdown().await?;
    if let Some(desktop) = desktop {
        desktop.wait_pending(NOTIFY_GRACE).await;
    }
    Ok(engine)
}

pub async fn countdown(args: CountdownArgs, opts: &GlobalOpts) -> CliResult {
    let time = CustomTime::new(args.minutes, args.seconds)?;
    if time.total_secs() == Some(0) {
        return Err("nothing to count down: duration is zero".into());
    }

    let config = Config::load_or_default();
    let Timer {
        handle,
        events,
        desktop,
    } = spawn_timer(config.settings(), &config, opts);
    let mut session = Session::new(&handle, events, opts, Stop::FirstCompletion);

    handle.set_custom_time(args.minutes, args.seconds)?;
    handle.start()?;
    session.follow(&handle).await?;

    finish(handle, desktop).await?;
    Ok(())
}

pub async fn pomodoro(args: PomodoroArgs, opts: &GlobalOpts) -> CliResult {
    let config = Config::load_or_default();
    let defaults = &config.pomodoro;
    let settings = Settings::from_minutes(
        args.work.unwrap_or(defaults.work_minutes),
        args.short_break.unwrap_or(defaults.short_break_minutes),
        args.long_break.unwrap_or(defaults.long_break_minutes),
        args.cycles.unwrap_or(defaults.cycles_before_long_break),
    );
    let stop = match args.rounds {
        Some(0) => return Err("--rounds must be at least 1".into()),
        Some(rounds) => Stop::AfterWorkCycles(rounds),
        None => Stop::Never,
    };

    let Timer {
        handle,
        events,
        desktop,
    } = spawn_timer(settings, &config, opts);
    let mut session = Session::new(&handle, events, opts, stop);

    handle.set_mode(Mode::Pomodoro)?;
    handle.start()?;
    session.follow(&handle).await?;

    let engine = finish(handle, desktop).await?;
    tracing::info!(cycles = engine.completed_work_cycles(), "pomodoro session ended");
    Ok(())
}

const HELP: &str = "\
commands:
  start | pause | reset
  set <minutes> <seconds>     arm a regular countdown
  mode regular|pomodoro
  work|short|long <minutes>   change a pomodoro duration
  cycles <n>                  work cycles before a long break
  status | help | quit";

/// A parsed line of interactive input.
#[derive(Debug)]
enum Input {
    Send(Command),
    Status,
    Help,
    Quit,
}

fn parse_minutes(raw: Option<&str>) -> Result<u64, String> {
    let raw = raw.ok_or("missing number of minutes")?;
    raw.parse::<u64>()
        .map_err(|e| format!("'{raw}' is not a number of minutes: {e}"))
}

fn parse_line(line: &str, settings: &Settings) -> Result<Option<Input>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };
    let input = match verb.to_ascii_lowercase().as_str() {
        "start" | "s" => Input::Send(Command::Start),
        "pause" | "p" => Input::Send(Command::Pause),
        "reset" | "r" => Input::Send(Command::Reset),
        "set" => {
            let minutes = words.next().unwrap_or("");
            let seconds = words.next().unwrap_or("0");
            // The engine would ignore bad input silently; report it here.
            CustomTime::parse(minutes, seconds).map_err(|e| e.to_string())?;
            Input::Send(Command::SetCustomTimeInput {
                minutes: minutes.to_string(),
                seconds: seconds.to_string(),
            })
        }
        "mode" => {
            let mode = words
                .next()
                .unwrap_or("")
                .parse::<Mode>()
                .map_err(|e| e.to_string())?;
            Input::Send(Command::SetMode(mode))
        }
        "work" => {
            let mut next = *settings;
            next.work_duration_secs = parse_minutes(words.next())?.saturating_mul(60);
            Input::Send(Command::UpdateSettings(next.clamped()))
        }
        "short" => {
            let mut next = *settings;
            next.short_break_secs = parse_minutes(words.next())?.saturating_mul(60);
            Input::Send(Command::UpdateSettings(next.clamped()))
        }
        "long" => {
            let mut next = *settings;
            next.long_break_secs = parse_minutes(words.next())?.saturating_mul(60);
            Input::Send(Command::UpdateSettings(next.clamped()))
        }
        "cycles" => {
            let raw = words.next().ok_or("missing cycle count")?;
            let mut next = *settings;
            next.cycles_before_long_break = raw
                .parse::<u32>()
                .map_err(|e| format!("'{raw}' is not a cycle count: {e}"))?;
            Input::Send(Command::UpdateSettings(next.clamped()))
        }
        "status" => Input::Status,
        "help" | "?" => Input::Help,
        "quit" | "q" | "exit" => Input::Quit,
        other => return Err(format!("unknown command '{other}', try 'help'")),
    };
    Ok(Some(input))
}

pub async fn interactive(args: InteractiveArgs, opts: &GlobalOpts) -> CliResult {
    let config = Config::load_or_default();
    let mut settings = config.settings();
    let Timer {
        handle,
        events,
        desktop,
    } = spawn_timer(settings, &config, opts);
    let mut session = Session::new(&handle, events, opts, Stop::Never);

    handle.set_mode(args.mode.unwrap_or(config.default_mode))?;
    if !opts.json {
        eprintln!("{HELP}");
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            biased;
            _ = &mut ctrl_c => break,
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    // Piped input ran out: let a running countdown finish.
                    stdin_open = false;
                    if !handle.query().await?.running {
                        session.flush();
                        break;
                    }
                    continue;
                };
                match parse_line(&line, &settings) {
                    Ok(None) => {}
                    Ok(Some(Input::Quit)) => break,
                    Ok(Some(Input::Help)) => eprintln!("{HELP}"),
                    Ok(Some(Input::Status)) => {
                        let snap = handle.query().await?;
                        session.renderer.line(&crate::render::status_line(&snap));
                    }
                    Ok(Some(Input::Send(command))) => {
                        if let Command::UpdateSettings(next) = &command {
                            settings = *next;
                        }
                        handle.send(command)?;
                    }
                    Err(message) => eprintln!("{message}"),
                }
            }
            changed = session.snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let (snap, _) = session.flush();
                if !stdin_open && !snap.running {
                    break;
                }
            }
        }
    }

    finish(handle, desktop).await?;
    Ok(())
}
