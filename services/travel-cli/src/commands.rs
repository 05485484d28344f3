//! Command dispatch over the session, router and API functions

use anyhow::{Context, Result, anyhow};
use serde_json::{Value, json};
use tokio::sync::broadcast::{self, error::TryRecvError};
use tracing::{debug, warn};
use travel_api::{NewComment, NewPost, RapidApi, accounts, community, flights};
use travel_auth::{Registration, USERNAME_KEY};
use travel_routes::{Navigation, Router};
use travel_session::{Session, SessionEvent};

use crate::cli::Command;

pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Please log in again.";

/// What one command produced: JSON for stdout, notices for stderr.
#[derive(Debug)]
pub struct Outcome {
    pub output: Value,
    pub notices: Vec<String>,
}

pub struct App {
    session: Session,
    router: Router,
    rapidapi: RapidApi,
    events: broadcast::Receiver<SessionEvent>,
}

impl App {
    pub fn new(session: Session, rapidapi: RapidApi) -> Self {
        let router = Router::new(session.store().clone());
        let events = session.subscribe();
        Self {
            session,
            router,
            rapidapi,
            events,
        }
    }

    pub async fn run(&mut self, command: Command) -> Result<Outcome> {
        let mut notices = Vec::new();
        let output = self.dispatch(command, &mut notices).await?;
        self.drain_events(&mut notices).await;
        Ok(Outcome { output, notices })
    }

    async fn dispatch(&mut self, command: Command, notices: &mut Vec<String>) -> Result<Value> {
        let session = &self.session;
        let output = match command {
            Command::Login { username, password } => {
                let login = accounts::login(session, &username, &password)
                    .await
                    .context("login failed")?;
                json!({ "username": login.username.unwrap_or(username), "authenticated": true })
            }
            Command::Register {
                username,
                email,
                nickname,
                password,
            } => {
                let registration = Registration {
                    username,
                    email,
                    nickname,
                    password2: password.clone(),
                    password,
                };
                accounts::register(session, &registration)
                    .await
                    .context("registration failed")?;
                json!({ "registered": registration.username })
            }
            Command::Logout => {
                accounts::logout(session).await.context("logout failed")?;
                json!({ "authenticated": false })
            }
            Command::Whoami => json!({
                "authenticated": session.is_authenticated().await,
                "username": session.store().get(USERNAME_KEY).await,
            }),
            Command::Flights {
                origin,
                destination,
                depart_date,
            } => {
                let found =
                    flights::search_flights(session, &self.rapidapi, &origin, &destination, &depart_date)
                        .await;
                serde_json::to_value(found)?
            }
            Command::Airports { query } => {
                Value::Array(flights::search_airports(session, &query).await)
            }
            Command::Details { token } => flights::flight_details(session, &token).await,
            Command::Posts => serde_json::to_value(community::list_posts(session).await)?,
            Command::Post { id } => {
                let post = community::get_post(session, id)
                    .await
                    .ok_or_else(|| anyhow!("post {id} not found"))?;
                serde_json::to_value(post)?
            }
            Command::Comments { post_id } => {
                serde_json::to_value(community::list_comments(session, post_id).await)?
            }
            Command::NewPost { title, content } => {
                let post = community::create_post(session, &NewPost { title, content })
                    .await
                    .context("creating post failed")?;
                serde_json::to_value(post)?
            }
            Command::DeletePost { id } => {
                community::delete_post(session, id)
                    .await
                    .with_context(|| format!("deleting post {id} failed"))?;
                json!({ "deleted": id })
            }
            Command::Comment { post_id, content } => {
                let comment = community::create_comment(session, post_id, &NewComment { content })
                    .await
                    .context("creating comment failed")?;
                serde_json::to_value(comment)?
            }
            Command::DeleteComment { id } => {
                community::delete_comment(session, id)
                    .await
                    .with_context(|| format!("deleting comment {id} failed"))?;
                json!({ "deleted": id })
            }
            Command::Navigate { path } => {
                let navigation = self.router.navigate(&path).await;
                if let Navigation::Redirected { notice, .. } = &navigation {
                    notices.push((*notice).to_string());
                }
                serde_json::to_value(navigation)?
            }
        };
        Ok(output)
    }

    /// Apply session events raised while the command ran.
    async fn drain_events(&mut self, notices: &mut Vec<String>) {
        loop {
            match self.events.try_recv() {
                Ok(event) => {
                    debug!(?event, "session event");
                    if let Some(navigation) = self.router.apply(&event).await {
                        notices.push(SESSION_EXPIRED_NOTICE.to_string());
                        debug!(location = %navigation.location().path, "moved to login");
                    }
                }
                Err(TryRecvError::Lagged(skipped)) => {
                    warn!(skipped, "session events dropped");
                }
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }
    }

    #[cfg(test)]
    fn router(&self) -> &Router {
        &self.router
    }
}
