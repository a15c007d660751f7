//! Mock SMTP relay for testing delivery scenarios
//!
//! A configurable plaintext relay that speaks enough SMTP to exercise the
//! real transport: greeting, EHLO, AUTH LOGIN, MAIL FROM, RCPT TO, DATA,
//! QUIT. Responses are scripted per command so tests can inject failures,
//! and every received command is recorded for verification.
#![allow(dead_code)] // Test utility module - not all methods used in every test

use std::{
    net::SocketAddr,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{TcpListener, TcpStream},
    sync::RwLock,
};

/// SMTP command received by the mock relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SmtpCommand {
    /// EHLO command with hostname
    Ehlo(String),
    /// AUTH LOGIN initiation
    AuthLogin,
    /// Username line of the AUTH LOGIN exchange (decoded)
    AuthUsername(String),
    /// Password line of the AUTH LOGIN exchange (decoded)
    AuthPassword(String),
    /// MAIL FROM command
    MailFrom(String),
    /// RCPT TO command
    RcptTo(String),
    /// DATA command
    Data,
    /// Message content (after DATA, up to the dot line)
    MessageContent(String),
    /// QUIT command
    Quit,
    /// Unknown/other command
    Other(String),
}

/// Response configuration for a single SMTP command
#[derive(Debug, Clone)]
pub struct SmtpResponse {
    pub code: u16,
    pub message: String,
}

impl SmtpResponse {
    fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    fn to_line(&self) -> String {
        format!("{} {}\r\n", self.code, self.message)
    }
}

#[derive(Debug, Clone)]
struct MockServerConfig {
    greeting: SmtpResponse,
    auth_response: SmtpResponse,
    mail_from_response: SmtpResponse,
    rcpt_to_response: SmtpResponse,
    data_response: SmtpResponse,
    data_end_response: SmtpResponse,
    quit_response: SmtpResponse,
}

impl Default for MockServerConfig {
    fn default() -> Self {
        Self {
            greeting: SmtpResponse::new(220, "Mock SMTP Relay"),
            auth_response: SmtpResponse::new(235, "Authentication successful"),
            mail_from_response: SmtpResponse::new(250, "OK"),
            rcpt_to_response: SmtpResponse::new(250, "OK"),
            data_response: SmtpResponse::new(354, "Start mail input; end with <CRLF>.<CRLF>"),
            data_end_response: SmtpResponse::new(250, "OK: Message accepted"),
            quit_response: SmtpResponse::new(221, "Bye"),
        }
    }
}

/// Builder for configuring the mock relay
#[derive(Debug, Default)]
pub struct MockSmtpServerBuilder {
    config: MockServerConfig,
}

impl MockSmtpServerBuilder {
    #[must_use]
    pub fn with_auth_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.auth_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_mail_from_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.mail_from_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_rcpt_to_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.rcpt_to_response = SmtpResponse::new(code, message);
        self
    }

    #[must_use]
    pub fn with_data_end_response(mut self, code: u16, message: impl Into<String>) -> Self {
        self.config.data_end_response = SmtpResponse::new(code, message);
        self
    }

    /// Bind the relay on an ephemeral port and start accepting connections.
    pub async fn build(self) -> std::io::Result<MockSmtpServer> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;

        let server = MockSmtpServer {
            addr,
            config: Arc::new(self.config),
            commands: Arc::new(RwLock::new(Vec::new())),
            connections: Arc::new(AtomicUsize::new(0)),
        };

        let config = Arc::clone(&server.config);
        let commands = Arc::clone(&server.commands);
        let connections = Arc::clone(&server.connections);

        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                connections.fetch_add(1, Ordering::Relaxed);
                let config = Arc::clone(&config);
                let commands = Arc::clone(&commands);
                tokio::spawn(async move {
                    let _ = handle_connection(stream, &config, &commands).await;
                });
            }
        });

        Ok(server)
    }
}

/// Mock SMTP relay for testing
pub struct MockSmtpServer {
    addr: SocketAddr,
    config: Arc<MockServerConfig>,
    commands: Arc<RwLock<Vec<SmtpCommand>>>,
    connections: Arc<AtomicUsize>,
}

impl MockSmtpServer {
    /// Create a new builder for configuring the mock relay
    #[must_use]
    pub fn builder() -> MockSmtpServerBuilder {
        MockSmtpServerBuilder::default()
    }

    /// The address the relay is listening on
    #[must_use]
    pub const fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// All commands received so far
    pub async fn commands(&self) -> Vec<SmtpCommand> {
        self.commands.read().await.clone()
    }

    /// Number of connections accepted so far
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.load(Ordering::Relaxed)
    }
}

/// Handle a single client connection
async fn handle_connection(
    stream: TcpStream,
    config: &MockServerConfig,
    commands: &RwLock<Vec<SmtpCommand>>,
) -> std::io::Result<()> {
    let (read_half, mut write_half) = stream.into_split();
    let mut reader = BufReader::new(read_half);

    write_half
        .write_all(config.greeting.to_line().as_bytes())
        .await?;

    // 0 = none, 1 = expecting username, 2 = expecting password
    let mut auth_stage = 0u8;
    let mut in_data = false;
    let mut data_buffer = String::new();

    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }
        let trimmed = line.trim_end_matches(['\r', '\n']);

        if in_data {
            if trimmed == "." {
                in_data = false;
                commands
                    .write()
                    .await
                    .push(SmtpCommand::MessageContent(std::mem::take(&mut data_buffer)));
                write_half
                    .write_all(config.data_end_response.to_line().as_bytes())
                    .await?;
            } else {
                data_buffer.push_str(trimmed);
                data_buffer.push_str("\r\n");
            }
            continue;
        }

        if auth_stage == 1 {
            commands
                .write()
                .await
                .push(SmtpCommand::AuthUsername(base64_decode(trimmed)));
            auth_stage = 2;
            write_half.write_all(b"334 UGFzc3dvcmQ6\r\n").await?;
            continue;
        }

        if auth_stage == 2 {
            commands
                .write()
                .await
                .push(SmtpCommand::AuthPassword(base64_decode(trimmed)));
            auth_stage = 0;
            write_half
                .write_all(config.auth_response.to_line().as_bytes())
                .await?;
            continue;
        }

        let upper = trimmed.to_ascii_uppercase();
        if let Some(domain) = upper.strip_prefix("EHLO ") {
            commands
                .write()
                .await
                .push(SmtpCommand::Ehlo(domain.to_lowercase()));
            // Multi-line capability listing, AUTH LOGIN advertised.
            write_half
                .write_all(b"250-mock.relay\r\n250-AUTH LOGIN PLAIN\r\n250 SIZE 10485760\r\n")
                .await?;
        } else if upper.starts_with("AUTH LOGIN") {
            commands.write().await.push(SmtpCommand::AuthLogin);
            auth_stage = 1;
            write_half.write_all(b"334 VXNlcm5hbWU6\r\n").await?;
        } else if let Some(from) = trimmed.strip_prefix("MAIL FROM:") {
            commands
                .write()
                .await
                .push(SmtpCommand::MailFrom(strip_brackets(from)));
            write_half
                .write_all(config.mail_from_response.to_line().as_bytes())
                .await?;
        } else if let Some(to) = trimmed.strip_prefix("RCPT TO:") {
            commands
                .write()
                .await
                .push(SmtpCommand::RcptTo(strip_brackets(to)));
            write_half
                .write_all(config.rcpt_to_response.to_line().as_bytes())
                .await?;
        } else if upper == "DATA" {
            commands.write().await.push(SmtpCommand::Data);
            if config.data_response.code == 354 {
                in_data = true;
            }
            write_half
                .write_all(config.data_response.to_line().as_bytes())
                .await?;
        } else if upper == "QUIT" {
            commands.write().await.push(SmtpCommand::Quit);
            write_half
                .write_all(config.quit_response.to_line().as_bytes())
                .await?;
            return Ok(());
        } else {
            commands
                .write()
                .await
                .push(SmtpCommand::Other(trimmed.to_string()));
            write_half
                .write_all(b"500 Unrecognized command\r\n")
                .await?;
        }
    }
}

fn strip_brackets(argument: &str) -> String {
    argument
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .to_string()
}

/// Decodes base64 (standard alphabet, `=` padding); invalid input comes
/// back lossy, which is fine for assertions.
fn base64_decode(encoded: &str) -> String {
    const CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    let mut bytes = Vec::with_capacity(encoded.len() / 4 * 3);
    let values: Vec<u32> = encoded
        .bytes()
        .filter(|b| *b != b'=')
        .filter_map(|b| CHARS.iter().position(|c| *c == b).map(|p| p as u32))
        .collect();

    for chunk in values.chunks(4) {
        let mut triple = 0u32;
        for (i, value) in chunk.iter().enumerate() {
            triple |= value << (18 - 6 * i);
        }
        bytes.push((triple >> 16) as u8);
        if chunk.len() > 2 {
            bytes.push((triple >> 8) as u8);
        }
        if chunk.len() > 3 {
            bytes.push(triple as u8);
        }
    }

    String::from_utf8_lossy(&bytes).into_owned()
}
