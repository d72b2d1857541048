// Simple command-line application to play chess

use rookery::{Color, Game, Player};
use std::io::{self, BufRead, Write};

struct Console<R> {
    input: R,
    closed: bool,
}

impl<R: BufRead> Player for Console<R> {
    fn next_move(&mut self, game: &Game) -> String {
        let side = match game.side_to_move() {
            Color::White => "White",
            Color::Black => "Black",
        };
        print!("{} move ({}): ", side, game.board().move_number());
        let _ = io::stdout().flush();
        let mut s = String::new();
        if self.input.read_line(&mut s).unwrap_or(0) == 0 {
            self.closed = true;
        }
        s.trim().to_string()
    }
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    let mut player = Console {
        input: io::stdin().lock(),
        closed: false,
    };
    let mut game = Game::new_initial();

    while !game.is_over() {
        println!("{}", game.board());
        if game.play_turn(&mut player) {
            println!();
            continue;
        }
        if player.closed {
            // Leaving the game counts as resignation
            let _ = game.resign(game.side_to_move());
            break;
        }
        if let Some(e) = game.last_error() {
            println!("Bad move: {}", e);
            println!();
        }
    }

    if let Some(result) = game.result() {
        println!("Game finished: {}", result);
    }
    println!("Notation:");
    for entry in game.move_history() {
        println!("{}", entry);
    }
}
