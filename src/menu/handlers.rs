use crate::component::{ExtractionEvent, HologramSession, RangeHandle};
use crate::config::RotationDirection;
use crate::pause;
use crate::signal::take_shutdown_request;
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Confirm, Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::time::Duration;

const PROGRESS_SCALE: u64 = 1000;
const EVENT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// 拖放路徑常帶有引號，一併去除
fn clean_input_path(raw: &str) -> PathBuf {
    PathBuf::from(raw.trim().trim_matches(|c| c == '"' || c == '\''))
}

pub fn run_import(
    term: &Term,
    shutdown_signal: &AtomicBool,
    session: &mut HologramSession,
) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style("=== 匯入轉盤影片 ===").cyan().bold());
    println!("{}", style("支援 mp4 / avi / mkv / mov，擷取中按 Ctrl-C 可停止").dim());

    let raw: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("影片路徑")
        .interact_text_on(term)?;
    let path = clean_input_path(&raw);

    let _ = take_shutdown_request(shutdown_signal);
    if let Err(e) = session.start_import(&path) {
        eprintln!("{} {}", style("錯誤:").red().bold(), e);
        pause(term)?;
        return Ok(());
    }

    let progress_bar = ProgressBar::new(PROGRESS_SCALE);
    progress_bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {percent}% {msg}")?
            .progress_chars("#>-"),
    );
    progress_bar.set_message("擷取影格中...");

    while session.is_importing() {
        if take_shutdown_request(shutdown_signal) {
            session.stop_import();
        }

        match session.next_event_timeout(EVENT_POLL_INTERVAL) {
            Some(ExtractionEvent::FrameRetained(_)) => {
                progress_bar.set_message(format!("已保留 {} 幀", session.frames().len()));
            }
            Some(ExtractionEvent::Progress(fraction)) => {
                progress_bar.set_position((f64::from(fraction) * PROGRESS_SCALE as f64) as u64);
            }
            Some(ExtractionEvent::Completed) => {
                progress_bar.finish_with_message(format!(
                    "擷取完成，保留 {} 幀",
                    session.frames().len()
                ));
            }
            Some(ExtractionEvent::Stopped) => {
                progress_bar.abandon_with_message(format!(
                    "已停止，保留 {} 幀",
                    session.frames().len()
                ));
            }
            Some(ExtractionEvent::Failed(e)) => {
                progress_bar.abandon_with_message("擷取失敗");
                eprintln!("{} {}", style("錯誤:").red().bold(), e);
            }
            None => {}
        }
    }

    pause(term)?;
    Ok(())
}

pub fn run_edit_selection(term: &Term, session: &mut HologramSession) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style("=== 設定選取範圍 ===").cyan().bold());

    let count = session.frames().len();
    if count == 0 {
        println!("{}", style("尚未匯入任何影格").yellow());
        pause(term)?;
        return Ok(());
    }

    let theme = ColorfulTheme::default();
    let selection = *session.selection();
    let max_index = count - 1;
    let in_range = |value: &usize| -> std::result::Result<(), String> {
        if *value <= max_index {
            Ok(())
        } else {
            Err(format!("請輸入 0 ~ {max_index}"))
        }
    };

    let start: usize = Input::with_theme(&theme)
        .with_prompt(format!("起點 (0 ~ {max_index})"))
        .default(selection.start)
        .validate_with(in_range)
        .interact_text_on(term)?;
    let end: usize = Input::with_theme(&theme)
        .with_prompt(format!("終點 (0 ~ {max_index})"))
        .default(selection.end)
        .validate_with(in_range)
        .interact_text_on(term)?;

    let directions = [RotationDirection::Clockwise, RotationDirection::CounterClockwise];
    let default_direction = directions
        .iter()
        .position(|&d| Some(d) == selection.direction)
        .unwrap_or(0);
    let direction = Select::with_theme(&theme)
        .with_prompt("旋轉方向")
        .items(&directions)
        .default(default_direction)
        .interact_on(term)?;

    let loop_around = Confirm::with_theme(&theme)
        .with_prompt("循環（交換起點與終點）？")
        .default(selection.loop_around)
        .interact_on(term)?;

    let padding: usize = Input::with_theme(&theme)
        .with_prompt("首尾補幀數")
        .default(session.padding())
        .interact_text_on(term)?;

    session.set_range(start, end)?;
    session.set_direction(directions[direction]);
    session.set_loop_around(loop_around);
    session.set_padding(padding);

    println!("\n{}", style("已更新選取範圍").green());
    std::thread::sleep(Duration::from_secs(1));
    Ok(())
}

/// 以上一格 / 下一格微調起點或終點
pub fn run_step_handle(term: &Term, session: &mut HologramSession) -> Result<()> {
    if session.frames().is_empty() {
        term.clear_screen()?;
        println!("{}", style("尚未匯入任何影格").yellow());
        pause(term)?;
        return Ok(());
    }

    let theme = ColorfulTheme::default();
    let Some(handle) = Select::with_theme(&theme)
        .with_prompt("要調整的位置")
        .items(&["起點", "終點"])
        .default(0)
        .interact_on_opt(term)?
    else {
        return Ok(());
    };
    let handle = if handle == 0 {
        RangeHandle::Start
    } else {
        RangeHandle::End
    };

    loop {
        term.clear_screen()?;
        let index = session.selection().index(handle);
        let frame = session
            .frames()
            .path(index)
            .map(|p| p.display().to_string())
            .unwrap_or_default();
        println!(
            "{} {} {}",
            style("目前位置:").dim(),
            style(index).cyan().bold(),
            style(frame).dim()
        );

        let action = Select::with_theme(&theme)
            .items(&["上一格", "下一格", "完成"])
            .default(1)
            .interact_on_opt(term)?;

        match action {
            Some(0) => {
                session.step_handle(handle, -1)?;
            }
            Some(1) => {
                session.step_handle(handle, 1)?;
            }
            _ => break,
        }
    }

    Ok(())
}

pub fn run_convert(term: &Term, session: &HologramSession) -> Result<()> {
    term.clear_screen()?;
    println!("{}", style("=== 轉換為全像影格 ===").cyan().bold());

    match session.convert() {
        Ok(job) => {
            println!(
                "{} {} 幀 → {}",
                style("完成:").green().bold(),
                job.total_frames,
                job.output_dir.display()
            );
        }
        Err(e) => eprintln!("{} {}", style("錯誤:").red().bold(), e),
    }

    pause(term)?;
    Ok(())
}
