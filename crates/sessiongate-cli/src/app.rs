//! Command handling on top of the session store and navigation guard.

use std::io::{self, Write};

use anyhow::Result;
use chrono::Utc;
use tracing::warn;

use sessiongate_core::{
    Config, CookieStore, Credentials, Navigation, NavigationGuard, SessionStore,
};

pub struct App {
    config: Config,
    session: SessionStore,
    guard: NavigationGuard,
}

impl App {
    pub fn new(config: Config) -> Result<Self> {
        let cache_dir = config.cache_dir()?;
        let session = config.session_store(cache_dir)?;
        let guard = config.guard();
        Ok(Self {
            config,
            session,
            guard,
        })
    }

    /// Prompt for anything missing, then log in.
    pub async fn login(&mut self, email: Option<String>) -> Result<()> {
        let email = match email.or_else(|| self.config.last_email.clone()) {
            Some(email) => email,
            None => prompt_email()?,
        };
        let password = rpassword::prompt_password("Password: ")?;

        let backend_url = self.config.backend_url.clone();
        self.session
            .login(&Credentials::new(email.clone(), password), &backend_url)
            .await;

        if let Some(error) = self.session.login_error() {
            println!("Login failed: {}", error);
            return Ok(());
        }

        self.config.last_email = Some(email);
        if let Err(e) = self.config.save() {
            warn!(error = %e, "Failed to save config");
        }

        println!(
            "Logged in as {} ({})",
            self.session.username().unwrap_or_default(),
            self.session.user_id().unwrap_or_default()
        );
        // Land wherever the guard sends a freshly authenticated user
        self.navigate(self.guard.entry_route().to_string());
        Ok(())
    }

    pub fn logout(&mut self) {
        self.session.logout();
        println!("Logged out");
    }

    /// Run the guard for a navigation to `to`, following redirects.
    pub fn navigate(&mut self, to: String) {
        let mut target = to;
        // Entry -> landing is the longest possible chain
        for _ in 0..3 {
            match self.guard.before_each(&target, &mut self.session) {
                Navigation::Proceed => {
                    println!("At {}", target);
                    return;
                }
                Navigation::Redirect(next) => {
                    println!("Redirected {} -> {}", target, next);
                    target = next;
                }
            }
        }
        warn!(route = %target, "Redirect loop, giving up");
    }

    pub fn status(&mut self) {
        // Rehydrate from the cookie by checking the landing route
        let landing = self.guard.landing_route().to_string();
        let nav = self.guard.before_each(&landing, &mut self.session);
        if let Some(notice) = redirect_notice(&landing, &nav) {
            println!("{}", notice);
        }

        match self.session.identity() {
            Some(identity) => {
                println!("Logged in as {} ({})", identity.username, identity.user_id);
                if let Some(expires) = self
                    .session
                    .cookies()
                    .load()
                    .and_then(|cookie| cookie.expires_at())
                {
                    let minutes = (expires - Utc::now()).num_minutes().max(0);
                    println!(
                        "Session expires {} ({}m left)",
                        expires.format("%Y-%m-%d %H:%M UTC"),
                        minutes
                    );
                }
            }
            None => println!("Not logged in"),
        }
    }
}

/// Line shown by `status` when the guard would not let the user stay.
fn redirect_notice(landing: &str, nav: &Navigation) -> Option<String> {
    match nav {
        Navigation::Proceed => None,
        Navigation::Redirect(next) => Some(format!("Session invalid, {} redirects to {}", landing, next)),
    }
}

fn prompt_email() -> Result<String> {
    print!("Email: ");
    io::stdout().flush()?;

    let mut email = String::new();
    io::stdin().read_line(&mut email)?;
    Ok(email.trim().to_string())
}
