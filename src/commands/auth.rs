use clap::Args;

use dietary::config::Config;
use dietary::views::{Destination, LoginView};
use dietary::Dietary;

use super::{prompt, prompt_secret};
use crate::session::{self, Session};

#[derive(Args)]
pub struct LoginCommand {
    /// Username (prompted for when omitted)
    username: Option<String>,
}

impl LoginCommand {
    pub async fn run(
        &self,
        dietary: &Dietary,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let username = match &self.username {
            Some(u) => u.clone(),
            None => prompt("Username: ")?,
        };
        let password = prompt_secret("Password: ")?;

        let mut view = LoginView::new(dietary.users.clone());
        let mut destination = view.submit(&username, &password).await;
        drop(password);

        loop {
            match destination {
                Some(Destination::Main(user)) => {
                    session::save(&config.session_path.value, &Session::new(&user.username))?;
                    println!("Logged in as {} ({})", user.display_name(), user.role);
                    return Ok(());
                }
                Some(Destination::ChangePassword(user)) => {
                    println!("{}, you must choose a new password.", user.display_name());
                    let new_password = prompt_secret("New password: ")?;
                    let confirm = prompt_secret("Confirm new password: ")?;

                    destination = match view.change_password(&new_password, &confirm).await {
                        Some(next) => Some(next),
                        None => {
                            eprintln!("{}", view.message().unwrap_or("Password change failed"));
                            if !view.awaiting_password_change() {
                                return Err("Password not changed; log in again".into());
                            }
                            if !super::confirm("Try again?")? {
                                view.cancel();
                                return Err("Password not changed; login cancelled".into());
                            }
                            Some(Destination::ChangePassword(user))
                        }
                    };
                }
                None => {
                    return Err(view.message().unwrap_or("Login failed").to_string().into());
                }
            }
        }
    }
}

pub fn logout(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    if session::clear(&config.session_path.value)? {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}
