//! Terminal display and UI rendering
//!
//! Features:
//! - Current level, pose name and instruction
//! - Accuracy colour-coded by feedback tier
//! - Hold progress bar with seconds remaining
//! - Level-up and journey-complete banners
//! - Per-constraint breakdown in debug mode
//! - Session summary and `--extract` report

use crate::pose::comparator::Comparison;
use crate::pose::reference::{Level, PoseLibrary, PoseReference};
use crate::session::{FeedbackTier, SessionEvent, SessionSnapshot, SessionStats};
use anyhow::Result;
use crossterm::{
    cursor, execute,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use serde::Serialize;
use std::io::{stdout, Write};

/// Frames a banner stays on screen
const BANNER_FRAMES: u32 = 20;

const BAR_WIDTH: usize = 30;

/// Terminal display manager
pub struct Display {
    debug: bool,
    banner: Option<(String, u32)>,
    /// Last notice about a rejected command
    notice: Option<String>,
}

impl Display {
    pub fn new(debug: bool) -> Self {
        Display {
            debug,
            banner: None,
            notice: None,
        }
    }

    pub fn toggle_debug(&mut self) {
        self.debug = !self.debug;
    }

    /// Clear screen
    pub fn clear(&self) -> Result<()> {
        let mut stdout = stdout();
        execute!(stdout, terminal::Clear(ClearType::All), cursor::MoveTo(0, 0))?;
        Ok(())
    }

    /// Draw one frame
    pub fn render(&mut self, snap: &SessionSnapshot, reference: &PoseReference) -> Result<()> {
        self.absorb_events(&snap.events);
        self.clear()?;
        let mut stdout = stdout();

        if snap.is_complete() {
            execute!(
                stdout,
                cursor::MoveTo(0, 1),
                SetForegroundColor(Color::Green),
                Print("🧘 Journey complete! All five poses held.\r\n"),
                ResetColor,
                Print("Press r to start again or q to quit.\r\n"),
            )?;
        } else {
            execute!(
                stdout,
                cursor::MoveTo(0, 1),
                SetForegroundColor(Color::Cyan),
                Print(format!(
                    "Level {}/{}: {} ({})\r\n",
                    snap.level,
                    Level::COUNT,
                    reference.name,
                    reference.sanskrit
                )),
                ResetColor,
                Print(format!("{}\r\n", reference.instruction)),
            )?;

            let color = tier_color(snap.feedback);
            let accuracy = if snap.detected {
                format!("{:.0}% ({})", snap.accuracy_percent, snap.feedback)
            } else {
                "no body detected".to_string()
            };
            execute!(
                stdout,
                cursor::MoveTo(0, 4),
                SetForegroundColor(Color::Magenta),
                Print("Accuracy: "),
                SetForegroundColor(color),
                Print(accuracy),
                ResetColor,
                Print("\r\n"),
                SetForegroundColor(Color::Magenta),
                Print("Hold:     "),
                ResetColor,
                Print(progress_bar(snap.hold_fraction, BAR_WIDTH)),
                Print(format!("  {:.1}s left\r\n", snap.hold_remaining_secs)),
            )?;

            if snap.feedback != FeedbackTier::Good {
                execute!(
                    stdout,
                    cursor::MoveTo(0, 7),
                    SetForegroundColor(Color::Yellow),
                    Print("Tip: "),
                    ResetColor,
                    Print(format!("{}\r\n", reference.hint)),
                )?;
            }
        }

        if let Some((text, frames)) = &mut self.banner {
            execute!(
                stdout,
                cursor::MoveTo(0, 9),
                SetForegroundColor(Color::Green),
                Print(format!("{text}\r\n")),
                ResetColor,
            )?;
            *frames -= 1;
        }
        if matches!(self.banner, Some((_, 0))) {
            self.banner = None;
        }

        if let Some(notice) = &self.notice {
            execute!(
                stdout,
                cursor::MoveTo(0, 10),
                SetForegroundColor(Color::Red),
                Print(format!("{notice}\r\n")),
                ResetColor,
            )?;
        }

        if self.debug {
            self.show_breakdown(snap)?;
        }

        self.show_help()?;
        stdout.flush()?;
        Ok(())
    }

    fn absorb_events(&mut self, events: &[SessionEvent]) {
        for event in events {
            match event {
                SessionEvent::LevelComplete(level) => {
                    self.banner = Some((format!("🎉 Level {level} complete!"), BANNER_FRAMES));
                    self.notice = None;
                }
                SessionEvent::JourneyComplete => {
                    self.banner = Some(("🏆 You finished the whole journey!".to_string(), BANNER_FRAMES));
                }
                SessionEvent::Jumped(level) => {
                    self.banner = Some((format!("Jumped to level {level}"), BANNER_FRAMES / 2));
                    self.notice = None;
                }
                SessionEvent::Reset => {
                    self.banner = Some(("Back to level 1".to_string(), BANNER_FRAMES / 2));
                    self.notice = None;
                }
                SessionEvent::JumpRejected(target) => {
                    self.notice = Some(format!("No level {target}: choose 1-{}", Level::COUNT));
                }
            }
        }
    }

    /// Per-constraint measurements (debug mode)
    fn show_breakdown(&self, snap: &SessionSnapshot) -> Result<()> {
        let mut stdout = stdout();
        execute!(
            stdout,
            cursor::MoveTo(0, 12),
            SetForegroundColor(Color::Blue),
            Print("─".repeat(50)),
            Print("\r\n"),
            ResetColor,
        )?;
        for result in &snap.constraints {
            let line = match (result.measured, result.similarity) {
                (Some(value), Some(similarity)) => format!(
                    "{:<28} {:>8.2}  {:>4.0}%  w{:.1}\r\n",
                    result.name,
                    value,
                    similarity * 100.0,
                    result.weight
                ),
                _ => format!("{:<28} {:>8}\r\n", result.name, "n/a"),
            };
            let color = match result.similarity {
                Some(s) if s >= 0.9 => Color::Green,
                Some(s) if s >= 0.6 => Color::Yellow,
                Some(_) => Color::Red,
                None => Color::DarkGrey,
            };
            execute!(stdout, SetForegroundColor(color), Print(line), ResetColor)?;
        }
        Ok(())
    }

    /// Show help text
    pub fn show_help(&self) -> Result<()> {
        let mut stdout = stdout();
        let (_, rows) = terminal::size().unwrap_or((80, 24));
        execute!(
            stdout,
            cursor::MoveTo(0, rows.saturating_sub(1)),
            SetForegroundColor(Color::DarkGrey),
            Print("1-5 jump to level  |  r reset  |  d debug  |  q quit"),
            ResetColor
        )?;
        Ok(())
    }

    /// Reset terminal state and cleanup
    pub fn shutdown(&self) -> Result<()> {
        let mut stdout = stdout();
        execute!(stdout, cursor::Show)?;
        terminal::disable_raw_mode()?;
        Ok(())
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(false)
    }
}

impl Drop for Display {
    fn drop(&mut self) {
        // Best effort cleanup
        let _ = self.shutdown();
    }
}

/// Colour for a feedback tier
pub fn tier_color(tier: FeedbackTier) -> Color {
    match tier {
        FeedbackTier::Good => Color::Green,
        FeedbackTier::Adjust => Color::Yellow,
        FeedbackTier::Poor => Color::Red,
    }
}

/// `[#####.....]` style bar for a fraction in [0, 1]
pub fn progress_bar(fraction: f32, width: usize) -> String {
    let filled = ((fraction.clamp(0.0, 1.0) * width as f32).round() as usize).min(width);
    format!("[{}{}]", "█".repeat(filled), "·".repeat(width - filled))
}

/// One JSON line per frame, for headless runs
pub fn write_json<W: Write, T: Serialize>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer(&mut *out, value)?;
    out.write_all(b"\n")?;
    Ok(())
}

/// End-of-session summary on plain stdout
pub fn show_summary(stats: &SessionStats, library: &PoseLibrary, reached: &str) {
    println!("\n🎉 Session Complete!");
    println!(
        "📊 {} frames | {:.0}% detected | trend accuracy {:.0}% | reached {}",
        stats.frames(),
        stats.detection_rate() * 100.0,
        stats.ema_accuracy() * 100.0,
        reached
    );
    for reference in library.iter() {
        println!(
            "   Level {} {:<14} best {:>3.0}%  broken holds {}",
            reference.level,
            reference.name,
            stats.best_accuracy(reference.level) * 100.0,
            stats.broken_holds(reference.level)
        );
    }

    let weak = stats.weak_constraints();
    if !weak.is_empty() {
        println!("⚠️  Work on:");
        for (level, name, misses) in weak.iter().take(5) {
            println!("   Level {level}: {name} ({misses} frames off)");
        }
    }
    println!("🙏 Thanks for practicing!");
}

/// Measured values of one recorded frame against every reference
pub fn show_extraction(results: &[(&PoseReference, Comparison)]) {
    for (reference, comparison) in results {
        println!(
            "Level {} {} ({}): {:.1}%",
            reference.level,
            reference.name,
            reference.sanskrit,
            comparison.percent()
        );
        for result in &comparison.constraints {
            match (result.measured, result.similarity) {
                (Some(value), Some(similarity)) => println!(
                    "  {:<28} {:>8.3}  similarity {:.2}",
                    result.name, value, similarity
                ),
                _ => println!("  {:<28} {:>8}", result.name, "n/a"),
            }
        }
    }
}
