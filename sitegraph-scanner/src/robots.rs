use reqwest::Client;
use texting_robots::Robot;
use tracing::{debug, info, warn};
use url::Url;

/// Decides whether a URL may be fetched.
pub trait RobotsPolicy {
    fn can_fetch(&self, url: &str) -> bool;
}

/// robots.txt policy for a single origin, evaluated for the `*` agent.
///
/// The gate fails open: if robots.txt cannot be loaded or parsed every URL is
/// permitted.
#[derive(Default)]
pub struct RobotsGate {
    robot: Option<Robot>,
}

impl RobotsGate {
    /// A gate that permits everything.
    pub fn disabled() -> Self {
        Self { robot: None }
    }

    /// Build a gate from a robots.txt body. A body that fails to parse
    /// yields a disabled gate.
    pub fn from_body(body: &[u8]) -> Self {
        match Robot::new("*", body) {
            Ok(robot) => Self { robot: Some(robot) },
            Err(e) => {
                warn!("Could not parse robots.txt, ignoring it: {}", e);
                Self::disabled()
            }
        }
    }

    /// Fetch `{origin}/robots.txt` once with the given client.
    pub async fn load(client: &Client, origin: &Url) -> Self {
        let robots_url = match origin.join("/robots.txt") {
            Ok(u) => u,
            Err(e) => {
                warn!("Could not build robots.txt URL for {}: {}", origin, e);
                return Self::disabled();
            }
        };

        let response = match client.get(robots_url.clone()).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!("Could not load {}: {}", robots_url, e);
                return Self::disabled();
            }
        };

        if !response.status().is_success() {
            info!(
                "No usable robots.txt at {} (status {}), all paths allowed",
                robots_url,
                response.status().as_u16()
            );
            return Self::disabled();
        }

        match response.bytes().await {
            Ok(body) => {
                debug!("Loaded robots.txt from {}", robots_url);
                Self::from_body(&body)
            }
            Err(e) => {
                warn!("Could not read {}: {}", robots_url, e);
                Self::disabled()
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.robot.is_some()
    }
}

impl RobotsPolicy for RobotsGate {
    fn can_fetch(&self, url: &str) -> bool {
        match &self.robot {
            Some(robot) => robot.allowed(url),
            None => true,
        }
    }
}
