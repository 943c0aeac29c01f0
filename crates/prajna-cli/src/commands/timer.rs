use std::io::{BufRead, Write};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use clap::{Subcommand, ValueEnum};
use prajna_core::notify::{subtitle_for, NotifyResult};
use prajna_core::timer::display_ms_for;
use prajna_core::validation::countdown_ms;
use prajna_core::{
    Clock, Config, Database, Event, MeditationTimer, NewSession, SystemClock, TimerMode,
    TimerNotifier,
};
use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use super::{check_tags, print_json, resolve_tags};
use crate::format::{format_duration, format_timer};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Meditate in the foreground; Ctrl-C ends the session and saves it
    Run {
        /// Countdown length in minutes (1-1440). Open-ended when omitted
        #[arg(long)]
        minutes: Option<u64>,
        /// Tag the saved session (repeatable, created if missing)
        #[arg(long = "tag")]
        tags: Vec<String>,
        /// What to do with an unfinished session from a killed run
        #[arg(long, value_enum)]
        recovered: Option<RecoveredChoice>,
    },
    /// Resolve an unfinished session from a killed run without starting a new one
    Recover {
        /// Save the unfinished session
        #[arg(long, conflicts_with = "discard", required_unless_present = "discard")]
        accept: bool,
        /// Drop the unfinished session
        #[arg(long)]
        discard: bool,
        /// Tag the saved session (repeatable, created if missing)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum RecoveredChoice {
    Accept,
    Discard,
}

type Timer<'a> = MeditationTimer<&'a Database>;

/// Status line and bell on stderr.
struct TerminalNotifier {
    bell: bool,
    alarm_window: Duration,
    alarm_until: Option<Instant>,
}

impl TerminalNotifier {
    fn new(config: &Config) -> Self {
        Self {
            bell: config.notifications.enabled && config.notifications.bell,
            alarm_window: Duration::from_millis(config.notifications.alarm_auto_stop_ms),
            alarm_until: None,
        }
    }
}

impl TimerNotifier for TerminalNotifier {
    fn schedule_alarm(&mut self, after: Duration) -> NotifyResult {
        eprintln!("countdown: {}", format_duration(after.as_secs() as i64));
        Ok(())
    }

    fn countdown_completed(&mut self) -> NotifyResult {
        if self.bell {
            self.alarm_until = Some(Instant::now() + self.alarm_window);
        }
        Ok(())
    }

    fn update_live(&mut self, display: &str, subtitle: &str) -> NotifyResult {
        let mut err = std::io::stderr().lock();
        let prefix = if subtitle == subtitle_for(Some(TimerMode::Overtime)) {
            "+"
        } else {
            ""
        };
        write!(err, "\r{prefix}{display}  {subtitle}   ")?;
        if let Some(until) = self.alarm_until {
            if Instant::now() < until {
                write!(err, "\x07")?;
            } else {
                self.alarm_until = None;
            }
        }
        err.flush()?;
        Ok(())
    }

    fn dismiss(&mut self) -> NotifyResult {
        self.alarm_until = None;
        eprintln!();
        Ok(())
    }
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load()?;
    let db = Database::open()?;
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    match action {
        TimerAction::Run {
            minutes,
            tags,
            recovered,
        } => {
            // Reject bad arguments before the recovery snapshot is read.
            let target_ms = minutes
                .or(config.default_duration_min())
                .map(countdown_ms)
                .transpose()?;
            let tags = check_tags(&tags)?;

            let mut timer = open_timer(&db, clock.clone(), &config);
            if timer.has_recovery_data() {
                let choice = match recovered {
                    Some(choice) => choice,
                    None => prompt_recovery(timer.recovered_elapsed_ms())?,
                };
                settle_recovery(&mut timer, &db, clock.today(), choice, &[])?;
            }
            let tag_ids = resolve_tags(&db, &tags)?;

            timer.start(target_ms);
            meditate(&mut timer)?;

            if let Some(event) = timer.stop() {
                if let Event::TimerStopped {
                    elapsed_ms,
                    mode,
                    duration_ms,
                    ..
                } = &event
                {
                    let shown = display_ms_for(*mode, *duration_ms, *elapsed_ms);
                    eprintln!("session ended at {}", format_timer(*mode, shown));
                }
                print_json(&event)?;
            }
            save_and_reset(&mut timer, &db, clock.today(), &tag_ids)?;
        }
        TimerAction::Recover {
            accept,
            discard: _,
            tags,
        } => {
            let tags = check_tags(&tags)?;
            let mut timer = open_timer(&db, clock.clone(), &config);
            if !timer.has_recovery_data() {
                println!("no unfinished session");
                return Ok(());
            }
            let tag_ids = resolve_tags(&db, &tags)?;
            let choice = if accept {
                RecoveredChoice::Accept
            } else {
                RecoveredChoice::Discard
            };
            settle_recovery(&mut timer, &db, clock.today(), choice, &tag_ids)?;
        }
    }
    Ok(())
}

/// Open the timer for this process. A pending recovery offer is written back
/// right away and only leaves the store once it is accepted or discarded.
fn open_timer<'a>(db: &'a Database, clock: Arc<dyn Clock>, config: &Config) -> Timer<'a> {
    let timer = MeditationTimer::open(db, clock, config.timer_options())
        .with_notifier(Box::new(TerminalNotifier::new(config)));
    if timer.has_recovery_data() && !timer.hold_recovery() {
        warn!("unfinished session is only kept in memory until answered");
    }
    timer
}

/// Drive the display until Ctrl-C.
fn meditate(timer: &mut Timer<'_>) -> Result<(), Box<dyn std::error::Error>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    runtime.block_on(async {
        let mut ticker = tokio::time::interval(timer.tick_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Some(event) = timer.tick() {
                        info!(?event, "countdown completed");
                    }
                }
                result = &mut shutdown => {
                    result?;
                    break;
                }
            }
        }
        Ok::<(), std::io::Error>(())
    })?;
    Ok(())
}

fn prompt_recovery(elapsed_ms: u64) -> Result<RecoveredChoice, Box<dyn std::error::Error>> {
    eprint!(
        "Found an unfinished session of {}. Save it? [y/N] ",
        format_duration((elapsed_ms / 1000) as i64)
    );
    std::io::stderr().flush()?;

    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    Ok(match answer.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" => RecoveredChoice::Accept,
        _ => RecoveredChoice::Discard,
    })
}

fn settle_recovery(
    timer: &mut Timer<'_>,
    db: &Database,
    today: NaiveDate,
    choice: RecoveredChoice,
    tag_ids: &[i64],
) -> Result<(), Box<dyn std::error::Error>> {
    match choice {
        RecoveredChoice::Accept => {
            if timer.accept_recovery().is_some() {
                save_and_reset(timer, db, today, tag_ids)?;
            }
        }
        RecoveredChoice::Discard => {
            if let Some(event) = timer.discard_recovery() {
                print_json(&event)?;
            }
        }
    }
    Ok(())
}

/// Save the stopped session dated `today`, then return the timer to idle.
/// Sessions under one second are dropped.
fn save_and_reset(
    timer: &mut Timer<'_>,
    db: &Database,
    today: NaiveDate,
    tag_ids: &[i64],
) -> Result<(), Box<dyn std::error::Error>> {
    let session = NewSession::from_timer(today, timer.elapsed_ms(), tag_ids.to_vec());
    if session.duration_seconds > 0 {
        let id = db.create_session(&session)?;
        if let Some(saved) = db.get_session(id)? {
            print_json(&saved)?;
        }
    } else {
        eprintln!("session shorter than a second, not saved");
    }
    timer.reset();
    Ok(())
}
