//! Text view controller that prints to stdout.

use lobby_core::{Game, Player};
use lobby_network::{CurrentView, GameView, LobbyView, Notice, ViewController, ViewKind};

#[derive(Debug, Default)]
struct Screen {
    games: Vec<Game>,
    game: Option<Game>,
}

impl LobbyView for Screen {
    fn populate_games(&mut self, games: Vec<Game>) {
        if games.is_empty() {
            println!("No open games. Create one with 'create <goal>'.");
        } else {
            println!("Open games:");
            for game in &games {
                println!("  [{}] {}", game.id, game);
            }
        }
        self.games = games;
    }
}

impl GameView for Screen {
    fn update_players(&mut self, players: Vec<Player>) {
        println!("Players:");
        for player in &players {
            println!("  {} ({}) {}", player.nickname, player.id, player.color);
        }
    }

    fn set_game(&mut self, game: Game) {
        println!("Joined {game}");
        self.game = Some(game);
    }
}

#[derive(Debug)]
pub struct TerminalView {
    current: Option<ViewKind>,
    screen: Screen,
}

impl TerminalView {
    pub fn new() -> Self {
        Self {
            current: Some(ViewKind::Lobby),
            screen: Screen::default(),
        }
    }

    pub fn showing(&self) -> Option<ViewKind> {
        self.current
    }

    /// Id of the game shown in the game view.
    pub fn active_game(&self) -> Option<&str> {
        match self.current {
            Some(ViewKind::Game) => self.screen.game.as_ref().map(|g| g.id.as_str()),
            _ => None,
        }
    }
}

impl Default for TerminalView {
    fn default() -> Self {
        Self::new()
    }
}

impl ViewController for TerminalView {
    fn load_view(&mut self, kind: ViewKind) {
        if kind != ViewKind::Game {
            self.screen.game = None;
        }
        self.current = Some(kind);
    }

    fn current_view(&mut self) -> CurrentView<'_> {
        match self.current {
            Some(ViewKind::ConnectionForm) => CurrentView::ConnectionForm,
            Some(ViewKind::Lobby) => CurrentView::Lobby(&mut self.screen),
            Some(ViewKind::Game) => CurrentView::Game(&mut self.screen),
            None => CurrentView::None,
        }
    }

    fn notify(&mut self, notice: Notice) {
        eprintln!("!! {notice}");
    }
}
