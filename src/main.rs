use std::io::{self, Write};
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor::{Hide, MoveTo, Show},
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    style::Print,
    terminal::{self, Clear, ClearType},
};
use log::{info, warn};

use cli_2048::engine::{Board, Move};
use cli_2048::game::{Game, SpawnPolicy, TurnOutcome};
use cli_2048::save;

#[derive(Debug, Parser)]
#[command(name = "cli-2048", about = "Play 2048 in the terminal")]
struct Args {
    /// Save file used by the 's' key and the startup load prompt
    #[arg(long, default_value = "save.txt")]
    save_file: PathBuf,

    /// Spawn a tile only when a move changes the board (the classic game
    /// spawns after every recognized move key)
    #[arg(long)]
    spawn_on_change: bool,

    /// Write the save file when quitting with 'q'
    #[arg(long)]
    save_on_quit: bool,
}

enum Exit {
    GameOver,
    Quit,
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(err) = run(&args) {
        restore_terminal();
        eprintln!("Error: {err:#}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> anyhow::Result<()> {
    println!("2048: slide equal tiles together with the arrow keys.");
    println!("Press 's' to save your progress and 'q' to quit.");

    let policy = if args.spawn_on_change {
        SpawnPolicy::IfChanged
    } else {
        SpawnPolicy::Always
    };

    let mut rng = rand::thread_rng();
    let mut game = match prompt_and_load(&args.save_file) {
        Some((board, score)) => {
            println!("Game loaded.");
            Game::resume(board, score, policy, &mut rng)
        }
        None => Game::new(policy, &mut rng),
    };

    terminal::enable_raw_mode().context("could not switch the terminal to raw mode")?;
    execute!(io::stdout(), Hide)?;
    let outcome = play(&mut game, args, &mut rng);
    restore_terminal();

    match outcome? {
        Exit::GameOver => {
            println!("Game over! Your score: {}", game.score());
            println!("Thanks for playing!");
        }
        Exit::Quit => {
            if args.save_on_quit {
                match save::save_to_path(&args.save_file, game.board(), game.score()) {
                    Ok(()) => println!("Game saved."),
                    Err(err) => eprintln!("Could not save: {err}"),
                }
            }
        }
    }
    Ok(())
}

/// Blocking key loop: one recognized key is fully processed (and the board
/// redrawn) before the next is read. Unrecognized keys are discarded.
fn play<R: rand::Rng + ?Sized>(
    game: &mut Game,
    args: &Args,
    rng: &mut R,
) -> anyhow::Result<Exit> {
    draw(game, None)?;
    loop {
        let code = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => key.code,
            _ => continue,
        };
        match code {
            KeyCode::Up | KeyCode::Down | KeyCode::Left | KeyCode::Right => {
                let dir = match code {
                    KeyCode::Up => Move::Up,
                    KeyCode::Down => Move::Down,
                    KeyCode::Left => Move::Left,
                    _ => Move::Right,
                };
                if game.turn(dir, rng) == TurnOutcome::GameOver {
                    draw(game, None)?;
                    return Ok(Exit::GameOver);
                }
                draw(game, None)?;
            }
            KeyCode::Char('s' | 'S') => {
                let message =
                    match save::save_to_path(&args.save_file, game.board(), game.score()) {
                        Ok(()) => {
                            info!("wrote save file {}", args.save_file.display());
                            String::from("Game saved.")
                        }
                        Err(err) => {
                            warn!("saving failed: {err}");
                            format!("Could not save: {err}")
                        }
                    };
                draw(game, Some(&message))?;
            }
            KeyCode::Char('q' | 'Q') => return Ok(Exit::Quit),
            _ => {}
        }
    }
}

fn draw(game: &Game, message: Option<&str>) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;
    execute!(stdout, Print(format!("Your score: {}\r\n\r\n", game.score())))?;
    for line in game.board().to_string().lines() {
        execute!(stdout, Print(line), Print("\r\n"))?;
    }
    execute!(stdout, Print("\r\n"))?;
    if let Some(message) = message {
        execute!(stdout, Print(message), Print("\r\n"))?;
    }
    execute!(stdout, Print("arrows: move   s: save   q: quit\r\n"))?;
    stdout.flush()
}

/// If a save file exists, offer to load it. The only accepted yes is the
/// full-line token `Y` (case-insensitive); anything else starts fresh, and
/// a malformed save is reported rather than fatal.
fn prompt_and_load(path: &Path) -> Option<(Board, u64)> {
    if !path.exists() {
        return None;
    }
    println!(
        "Found a save file. Load it? (press 'Y' then Enter to load, or 'N' then Enter to start over)"
    );
    let mut answer = String::new();
    if io::stdin().read_line(&mut answer).is_err() {
        return None;
    }
    if !answer.trim_end_matches(&['\r', '\n'][..]).eq_ignore_ascii_case("y") {
        return None;
    }
    match save::load_from_path(path) {
        Ok((board, score)) => {
            info!("loaded save file {}", path.display());
            Some((board, score))
        }
        Err(err) => {
            warn!("could not load save file {}: {err}", path.display());
            println!("Could not load the save file ({err}); starting a new game.");
            None
        }
    }
}

fn restore_terminal() {
    let _ = terminal::disable_raw_mode();
    let _ = execute!(io::stdout(), Show);
}
