// ABOUTME: REST gateway adapter for roster pagination and message delivery
// ABOUTME: Implements the watcher's RosterSource and Delivery traits over reqwest

use async_trait::async_trait;
use rollcall_core::{Config, MemberRecord};
use rollcall_watcher::{Delivery, GatewayError, RosterSource};
use serde::{Deserialize, Serialize};

pub struct DiscordGateway {
    http: reqwest::Client,
    api_base: String,
    token: String,
    group_id: String,
    channel_id: String,
}

#[derive(Debug, Deserialize)]
struct GuildMember {
    user: Option<UserPayload>,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id: String,
    #[serde(default)]
    username: String,
    #[serde(default)]
    discriminator: String,
}

#[derive(Debug, Serialize)]
struct MessagePayload<'a> {
    content: &'a str,
}

impl DiscordGateway {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_base: config.api_base.clone(),
            token: config.token.clone(),
            group_id: config.group_id.clone(),
            channel_id: config.channel_id.clone(),
        }
    }

    fn auth_header(&self) -> String {
        format!("Bot {}", self.token)
    }
}

#[async_trait]
impl RosterSource for DiscordGateway {
    async fn fetch_page(
        &self,
        after: Option<&str>,
        limit: u16,
    ) -> Result<Vec<MemberRecord>, GatewayError> {
        let url = format!("{}/guilds/{}/members", self.api_base, self.group_id);
        let mut request = self
            .http
            .get(&url)
            .header("Authorization", self.auth_header())
            .query(&[("limit", limit.to_string())]);
        if let Some(after) = after {
            request = request.query(&[("after", after)]);
        }

        let response = request
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: "guild members",
                status: status.as_u16(),
            });
        }

        let members: Vec<GuildMember> = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        // Entries without a user object carry nothing to reconcile against.
        Ok(members
            .into_iter()
            .filter_map(|member| member.user)
            .map(|user| MemberRecord::new(user.id, user.username, user.discriminator))
            .collect())
    }
}

#[async_trait]
impl Delivery for DiscordGateway {
    async fn send(&self, text: &str) -> Result<(), GatewayError> {
        let url = format!("{}/channels/{}/messages", self.api_base, self.channel_id);
        let response = self
            .http
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&MessagePayload { content: text })
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(GatewayError::Status {
                endpoint: "channel message",
                status: status.as_u16(),
            });
        }
        Ok(())
    }
}
