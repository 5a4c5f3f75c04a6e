use coachline_core::{ChatApi, ChatClient, ChatResponse, ClientError, Config, Conversation, Role};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use crate::tui::AppEvent;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendStatus {
    Unknown,
    Online,
    Offline,
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,

    pub conversation: Conversation,
    pub input_cursor: usize, // cursor position in the draft, in chars

    // Chat view
    pub chat_scroll: u16,
    pub chat_height: u16, // inner height of chat area for scroll calculations
    pub chat_width: u16,  // inner width of chat area for wrap calculations
    pub animation_frame: u8, // 0-2 for ellipsis animation

    pub backend: BackendStatus,
    pub client: ChatClient,
    events: UnboundedSender<AppEvent>,
}

impl App {
    pub fn new(config: &Config, events: UnboundedSender<AppEvent>) -> Self {
        let client = ChatClient::from_context(&config.execution_context());
        info!(base_url = %client.base_url(), "chat backend resolved");

        let conversation = match &config.greeting {
            Some(greeting) => Conversation::with_greeting(greeting.clone()),
            None => Conversation::new(),
        };

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            conversation,
            input_cursor: 0,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            backend: BackendStatus::Unknown,
            client,
            events,
        }
    }

    /// Probe the backend in the background; the result arrives as `AppEvent::Health`.
    pub fn check_backend(&self) {
        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let _ = tx.send(AppEvent::Health(client.health().await));
        });
    }

    pub fn record_health(&mut self, result: Result<(), ClientError>) {
        self.backend = match result {
            Ok(()) => BackendStatus::Online,
            Err(e) => {
                warn!(error = %e, "backend health check failed");
                BackendStatus::Offline
            }
        };
    }

    /// Submit the draft. Ignored when it is blank or a request is in flight.
    pub fn submit(&mut self) {
        let Some(text) = self.conversation.begin_turn() else {
            return;
        };
        self.input_cursor = 0;
        self.scroll_chat_to_bottom();

        let client = self.client.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let request = tokio::spawn(async move { client.send(&text).await });
            let _ = tx.send(AppEvent::Reply(request_outcome(request.await)));
        });
    }

    pub fn finish_turn(&mut self, result: Result<ChatResponse, ClientError>) {
        match &result {
            Ok(_) => self.backend = BackendStatus::Online,
            Err(e) if e.is_connectivity() => self.backend = BackendStatus::Offline,
            Err(_) => {}
        }
        if self.conversation.complete_turn(result) {
            self.scroll_chat_to_bottom();
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.conversation.is_sending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    // Draft editing. The draft is only editable while idle.

    pub fn insert_char(&mut self, c: char) {
        if self.conversation.is_sending() {
            return;
        }
        let byte_pos = char_to_byte_index(self.conversation.input(), self.input_cursor);
        self.conversation.input_mut().insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.conversation.is_sending() || self.input_cursor == 0 {
            return;
        }
        self.input_cursor -= 1;
        let byte_pos = char_to_byte_index(self.conversation.input(), self.input_cursor);
        self.conversation.input_mut().remove(byte_pos);
    }

    pub fn delete(&mut self) {
        if self.conversation.is_sending() {
            return;
        }
        if self.input_cursor < self.input_len() {
            let byte_pos = char_to_byte_index(self.conversation.input(), self.input_cursor);
            self.conversation.input_mut().remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        self.input_cursor = (self.input_cursor + 1).min(self.input_len());
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input_len();
    }

    fn input_len(&self) -> usize {
        self.conversation.input().chars().count()
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }

    pub fn scroll_down(&mut self, lines: u16) {
        let max = self.chat_line_count().saturating_sub(self.visible_height());
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(max);
    }

    /// Scroll chat to bottom so the newest message (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        let total_lines = self.chat_line_count();
        let visible_height = self.visible_height();

        self.chat_scroll = total_lines.saturating_sub(visible_height);
    }

    fn visible_height(&self) -> u16 {
        if self.chat_height > 0 {
            self.chat_height
        } else {
            20
        }
    }

    /// Rendered height of the chat log, matching the layout in `ui`.
    fn chat_line_count(&self) -> u16 {
        // Use actual chat width for wrap calculation, default to 50 if not set
        let wrap_width = if self.chat_width > 0 {
            self.chat_width as usize
        } else {
            50
        };

        let mut total_lines: u16 = 0;

        for msg in self.conversation.messages() {
            total_lines = total_lines.saturating_add(1); // Role line ("You:" or "Coach:")
            for line in msg.content.lines() {
                // Character count, not byte length, for proper UTF-8 handling
                let char_count = line.chars().count();
                let wrapped = char_count.div_ceil(wrap_width).max(1);
                total_lines = total_lines.saturating_add(u16::try_from(wrapped).unwrap_or(u16::MAX));
            }
            total_lines = total_lines.saturating_add(1); // Blank line after message
        }

        if self.conversation.is_sending() {
            total_lines = total_lines.saturating_add(2); // "Coach:" + "Thinking..."
        }

        total_lines
    }

    pub fn role_label(role: Role) -> &'static str {
        match role {
            Role::User => "You:",
            Role::Assistant => "Coach:",
        }
    }
}

pub const REQUEST_ABORTED_MESSAGE: &str =
    "The request stopped unexpectedly before the backend answered. Please try again.";

/// Fold a finished request task into a turn result. A task that panicked or
/// was aborted still resolves the turn, with a fixed message.
fn request_outcome(
    joined: Result<Result<ChatResponse, ClientError>, JoinError>,
) -> Result<ChatResponse, ClientError> {
    joined.unwrap_or_else(|e| {
        error!(error = %e, "chat request task failed");
        Err(ClientError::backend(REQUEST_ABORTED_MESSAGE))
    })
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::mpsc;

    fn app() -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        // A local port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        let config = Config {
            api_url: Some(format!("http://127.0.0.1:{}", port)),
            ..Config::default()
        };
        (App::new(&config, tx), rx)
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            app.insert_char(c);
        }
    }

    #[test]
    fn editing_is_utf8_safe() {
        let (mut app, _rx) = app();
        type_text(&mut app, "héllo");
        app.cursor_left();
        app.cursor_left();
        app.backspace();
        assert_eq!(app.conversation.input(), "hélo");
        app.cursor_home();
        app.delete();
        assert_eq!(app.conversation.input(), "élo");
        app.cursor_end();
        app.insert_char('!');
        assert_eq!(app.conversation.input(), "élo!");
    }

    #[test]
    fn uses_configured_greeting() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = Config {
            greeting: Some("Welcome back.".into()),
            ..Config::default()
        };
        let app = App::new(&config, tx);
        assert_eq!(app.conversation.messages()[0].content, "Welcome back.");
    }

    #[tokio::test]
    async fn submit_resolves_through_event_channel() {
        let (mut app, mut rx) = app();
        type_text(&mut app, "hello");
        app.submit();

        assert!(app.conversation.is_sending());
        assert_eq!(app.conversation.messages().len(), 2);
        assert_eq!(app.input_cursor, 0);

        // Typing is ignored while the request is pending.
        app.insert_char('x');
        assert_eq!(app.conversation.input(), "");

        let result = loop {
            match rx.recv().await {
                Some(AppEvent::Reply(result)) => break result,
                Some(_) => continue,
                None => panic!("channel closed"),
            }
        };
        assert!(result.as_ref().unwrap_err().is_connectivity());

        app.finish_turn(result);
        assert_eq!(app.conversation.messages().len(), 3);
        assert_eq!(app.backend, BackendStatus::Offline);
        assert!(app.conversation.last_error().is_some());
    }

    #[tokio::test]
    async fn panicked_request_still_resolves_the_turn() {
        let (mut app, _rx) = app();
        type_text(&mut app, "hello");
        app.submit();

        let task = tokio::spawn(async {
            if true {
                panic!("client blew up");
            }
            Ok::<_, ClientError>(ChatResponse { reply: String::new() })
        });
        let result = request_outcome(task.await);

        assert_eq!(result.as_ref().unwrap_err().message(), REQUEST_ABORTED_MESSAGE);
        app.finish_turn(result);
        assert_eq!(app.conversation.messages().len(), 3);
        assert!(!app.conversation.is_sending());
        assert_eq!(app.conversation.last_error(), Some(REQUEST_ABORTED_MESSAGE));
    }

    #[test]
    fn line_count_wraps_exact_width_once() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = Config {
            greeting: Some("x".repeat(10)),
            ..Config::default()
        };
        let mut app = App::new(&config, tx);
        app.chat_width = 10;
        // role line + one full-width line + blank
        assert_eq!(app.chat_line_count(), 3);

        app.chat_width = 9;
        assert_eq!(app.chat_line_count(), 4);
    }

    #[test]
    fn line_count_saturates_on_huge_logs() {
        let (tx, _rx) = mpsc::unbounded_channel();
        let config = Config {
            greeting: Some("line\n".repeat(70_000)),
            ..Config::default()
        };
        let mut app = App::new(&config, tx);
        app.chat_width = 80;
        assert_eq!(app.chat_line_count(), u16::MAX);
        app.scroll_chat_to_bottom();
    }

    #[test]
    fn blank_submit_spawns_nothing() {
        let (mut app, _rx) = app();
        type_text(&mut app, "   ");
        // No runtime here: a spawn would panic.
        app.submit();
        assert_eq!(app.conversation.messages().len(), 1);
    }
}
