use anyhow::{anyhow, bail, Context, Result};
use markly_auth::listener::CallbackListener;
use markly_auth::{AuthProvider, AuthService, History, MemoryHistory, Settings, UserIdentity};
use std::io::Write;
use std::sync::Arc;
use url::Url;

use crate::bookmarks::{display_url, BookmarkBoard, BookmarkStore};
use crate::cli::Command;

/// Runs one command against an auth service and a bookmark store.
///
/// Every command starts the way a page load does: the auth provider is
/// mounted on a fresh history (finalizing any redirect in it) before the
/// command looks at the user.
pub struct App<S: AuthService, B: BookmarkStore> {
    service: Arc<S>,
    store: Arc<B>,
    settings: Settings,
}

impl<S: AuthService, B: BookmarkStore> App<S, B> {
    pub fn new(service: Arc<S>, store: Arc<B>, settings: Settings) -> Self {
        Self {
            service,
            store,
            settings,
        }
    }

    pub async fn run<W: Write>(&self, command: Command, out: &mut W) -> Result<()> {
        let location = match &command {
            Command::Open { url } => self.resolve(url)?,
            _ => self.home()?,
        };
        tracing::info!(command = command.name(), path = location.path(), "Running command");

        let provider = AuthProvider::new(Arc::clone(&self.service), &self.settings);
        let history = MemoryHistory::new(location);
        provider.mount(&history).await?;

        let result = self.execute(command, &provider, &history, out).await;
        provider.teardown().await;
        result
    }

    async fn execute<W: Write>(
        &self,
        command: Command,
        provider: &AuthProvider<S>,
        history: &MemoryHistory,
        out: &mut W,
    ) -> Result<()> {
        match command {
            Command::Login => self.login(provider, out).await,
            Command::Logout => {
                if provider.state().user.is_none() {
                    writeln!(out, "Not signed in")?;
                    return Ok(());
                }
                provider.sign_out().await?;
                writeln!(out, "Signed out")?;
                Ok(())
            }
            Command::Whoami => {
                let state = provider.state();
                if let Some(error) = &state.error {
                    writeln!(out, "Error: {}", error)?;
                }
                match &state.user {
                    Some(user) => writeln!(out, "Signed in as {}", describe(user))?,
                    None => writeln!(out, "Not signed in")?,
                }
                Ok(())
            }
            Command::Open { .. } => {
                let state = provider.state();
                writeln!(out, "Location: {}", history.location())?;
                match &state.user {
                    Some(user) => writeln!(out, "Signed in as {}", describe(user))?,
                    None => writeln!(out, "Not signed in")?,
                }
                match state.error {
                    Some(error) => Err(anyhow!(error).context("Sign-in did not complete")),
                    None => Ok(()),
                }
            }
            Command::List => {
                let board = self.board().await?;
                if board.bookmarks().is_empty() {
                    writeln!(out, "No bookmarks yet")?;
                }
                for bookmark in board.bookmarks() {
                    writeln!(
                        out,
                        "{}  [{}] {}  {}",
                        bookmark.id,
                        bookmark.tag.as_deref().unwrap_or("-"),
                        bookmark.title,
                        display_url(&bookmark.url)
                    )?;
                }
                Ok(())
            }
            Command::Add { title, url, tag } => {
                let mut board = self.board().await?;
                if !board.add(&title, &url, tag.as_deref()).await? {
                    bail!("A bookmark needs both a title and a URL");
                }
                writeln!(
                    out,
                    "Saved \"{}\" ({} bookmarks)",
                    title.trim(),
                    board.bookmarks().len()
                )?;
                Ok(())
            }
            Command::Delete { id } => {
                let mut board = self.board().await?;
                board.delete(id).await?;
                writeln!(out, "Deleted {} ({} bookmarks left)", id, board.bookmarks().len())?;
                Ok(())
            }
        }
    }

    async fn login<W: Write>(&self, provider: &AuthProvider<S>, out: &mut W) -> Result<()> {
        if let Some(user) = provider.state().user {
            writeln!(out, "Already signed in as {}", describe(&user))?;
            return Ok(());
        }

        let service: Arc<dyn AuthService> = Arc::clone(&self.service) as Arc<dyn AuthService>;
        let listener = CallbackListener::bind(service, &self.settings)
            .await
            .context("Could not start the sign-in listener")?;

        let authorize_url = provider.sign_in_with_google().await?;
        writeln!(out, "Continue signing in with Google in your browser:")?;
        writeln!(out, "  {}", authorize_url)?;
        out.flush()?;

        if let Err(e) = open::that(authorize_url.as_str()) {
            tracing::warn!("Failed to open browser: {}", e);
            writeln!(out, "Could not open a browser; open the link above manually")?;
        }

        let user = listener.wait().await?;
        writeln!(out, "Signed in as {}", describe(&user))?;
        Ok(())
    }

    /// Board loaded for the current session
    async fn board(&self) -> Result<BookmarkBoard<B>> {
        let session = self
            .service
            .session()
            .await?
            .ok_or_else(|| anyhow!("Not signed in. Run `markly login` first."))?;

        let mut board = BookmarkBoard::new(Arc::clone(&self.store));
        board.set_session(Some(session)).await?;
        Ok(board)
    }

    fn home(&self) -> Result<Url> {
        Url::parse(&self.settings.site_url).context("Invalid site_url")
    }

    /// Absolute URLs are taken as is, anything else is resolved against the site
    fn resolve(&self, url: &str) -> Result<Url> {
        match Url::parse(url) {
            Ok(url) => Ok(url),
            Err(_) => self
                .home()?
                .join(url)
                .with_context(|| format!("Invalid URL: {}", url)),
        }
    }
}

fn describe(user: &UserIdentity) -> String {
    match (&user.display_name, &user.email) {
        (Some(name), Some(email)) => format!("{} <{}>", name, email),
        (Some(name), None) => name.clone(),
        (None, Some(email)) => email.clone(),
        (None, None) => user.id.to_string(),
    }
}
