use anyhow::Result;
use console::{Term, style};
use log::{info, warn};
use turntable_hologram::component::HologramSession;
use turntable_hologram::config::Config;
use turntable_hologram::init;
use turntable_hologram::menu::show_main_menu;
use turntable_hologram::signal::setup_shutdown_signal;

fn main() -> Result<()> {
    init::init();
    let term = Term::stdout();
    let shutdown_signal = setup_shutdown_signal()?;

    let mut config = Config::new()?;
    let mut session = HologramSession::new(&config);

    loop {
        match show_main_menu(&term, &shutdown_signal, &mut config, &mut session) {
            Ok(true) => {}
            Ok(false) => {
                term.clear_screen()?;
                println!("\n{}", style("再見！").green().bold());
                info!("Program exited normally");
                break;
            }
            Err(e) => {
                warn!("Program error: {e}");
                eprintln!("{} {}", style("錯誤:").red().bold(), e);
                break;
            }
        }
    }

    Ok(())
}
