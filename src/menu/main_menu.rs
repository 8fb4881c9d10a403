use crate::component::HologramSession;
use crate::config::save::save_settings;
use crate::config::{Config, RotationDirection};
use crate::menu::handlers::{run_convert, run_edit_selection, run_import, run_step_handle};
use anyhow::Result;
use console::{Term, style};
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;

pub fn show_main_menu(
    term: &Term,
    shutdown_signal: &AtomicBool,
    config: &mut Config,
    session: &mut HologramSession,
) -> Result<bool> {
    term.clear_screen()?;

    println!("{}", style("=== 轉盤影片全像轉換 ===").cyan().bold());
    println!("{}", style("按 ESC 離開").dim());
    print_session_status(session);

    let options = vec![
        "匯入影片",
        "設定選取範圍",
        "微調起點 / 終點",
        "轉換",
        "設定",
        "離開",
    ];

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("請選擇功能")
        .items(&options)
        .default(0)
        .interact_on_opt(term)?;

    match selection {
        Some(0) => {
            run_import(term, shutdown_signal, session)?;
            Ok(true)
        }
        Some(1) => {
            run_edit_selection(term, session)?;
            Ok(true)
        }
        Some(2) => {
            run_step_handle(term, session)?;
            Ok(true)
        }
        Some(3) => {
            run_convert(term, session)?;
            Ok(true)
        }
        Some(4) => {
            if show_settings_menu(term, config)? {
                session.apply_settings(config);
            }
            Ok(true)
        }
        Some(5) | None => Ok(false),
        _ => unreachable!(),
    }
}

fn print_session_status(session: &HologramSession) {
    let frames = session.frames();
    if frames.is_empty() {
        println!("{}\n", style("尚未匯入影片").dim());
        return;
    }

    let selection = session.selection();
    let direction = selection
        .direction
        .map_or_else(|| "未設定".to_string(), |d| d.to_string());
    println!(
        "\n{} {} ({} 幀)",
        style("影片:").dim(),
        frames.source_name(),
        frames.len()
    );
    println!(
        "{} {} → {}  {}{}  補幀 {}\n",
        style("選取:").dim(),
        selection.start,
        selection.end,
        direction,
        if selection.loop_around { "  循環" } else { "" },
        session.padding()
    );
}

/// 設定選單，有任何設定被儲存時回傳 `true`
fn show_settings_menu(term: &Term, config: &mut Config) -> Result<bool> {
    let mut changed = false;

    loop {
        term.clear_screen()?;

        println!("{}", style("=== 設定 ===").cyan().bold());
        println!("{}", style("按 ESC 返回").dim());
        println!(
            "\n{} {}",
            style("輸出資料夾:").dim(),
            config.settings.output_dir.display()
        );
        println!(
            "{} {}",
            style("預設方向:").dim(),
            config.settings.default_direction
        );
        println!(
            "{} {}",
            style("預設補幀:").dim(),
            config.settings.default_padding
        );
        println!(
            "{} {}\n",
            style("去重門檻:").dim(),
            config.settings.duplicate_cutoff
        );

        let options = vec!["輸出資料夾", "預設方向", "預設補幀", "去重門檻", "返回"];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("請選擇要修改的設定")
            .items(&options)
            .default(0)
            .interact_on_opt(term)?;

        let updated = match selection {
            Some(0) => edit_output_dir(term, config)?,
            Some(1) => edit_default_direction(term, config)?,
            Some(2) => edit_default_padding(term, config)?,
            Some(3) => edit_duplicate_cutoff(term, config)?,
            Some(4) | None => break,
            _ => unreachable!(),
        };

        if updated {
            save_settings(&config.settings)?;
            changed = true;
            println!("\n{}", style("設定已儲存").green());
            std::thread::sleep(std::time::Duration::from_secs(1));
        }
    }

    Ok(changed)
}

fn edit_output_dir(term: &Term, config: &mut Config) -> Result<bool> {
    let current = config.settings.output_dir.display().to_string();
    let value: String = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("輸出資料夾")
        .default(current.clone())
        .validate_with(|v: &String| {
            if v.trim().is_empty() {
                Err("資料夾不可為空")
            } else {
                Ok(())
            }
        })
        .interact_text_on(term)?;

    if value.trim() == current {
        return Ok(false);
    }
    config.settings.output_dir = PathBuf::from(value.trim());
    Ok(true)
}

fn edit_default_direction(term: &Term, config: &mut Config) -> Result<bool> {
    let directions = [RotationDirection::Clockwise, RotationDirection::CounterClockwise];
    let default_index = directions
        .iter()
        .position(|&d| d == config.settings.default_direction)
        .unwrap_or(0);

    let selection = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("預設方向")
        .items(&directions)
        .default(default_index)
        .interact_on_opt(term)?;

    // ESC pressed - return without saving
    let Some(selection) = selection else {
        return Ok(false);
    };

    let selected = directions[selection];
    if selected == config.settings.default_direction {
        return Ok(false);
    }
    config.settings.default_direction = selected;
    Ok(true)
}

fn edit_default_padding(term: &Term, config: &mut Config) -> Result<bool> {
    let value: usize = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("預設補幀數")
        .default(config.settings.default_padding)
        .interact_text_on(term)?;

    if value == config.settings.default_padding {
        return Ok(false);
    }
    config.settings.default_padding = value;
    Ok(true)
}

fn edit_duplicate_cutoff(term: &Term, config: &mut Config) -> Result<bool> {
    let value: u32 = Input::with_theme(&ColorfulTheme::default())
        .with_prompt("去重門檻（漢明距離小於此值視為重複）")
        .default(config.settings.duplicate_cutoff)
        .validate_with(|v: &u32| if *v >= 1 { Ok(()) } else { Err("門檻至少為 1") })
        .interact_text_on(term)?;

    if value == config.settings.duplicate_cutoff {
        return Ok(false);
    }
    config.settings.duplicate_cutoff = value;
    Ok(true)
}
