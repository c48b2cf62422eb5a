// Copyright  (C) 2020, Kisio Digital and/or its affiliates. All rights reserved.
//
// This file is part of Navitia,
// the software to build cool stuff with public transport.
//
// Hope you'll enjoy and contribute to this project,
// powered by Kisio Digital (www.kisio.com).
// Help us simplify mobility and open public transport:
// a non ending quest to the responsive locomotion way of traveling!
//
// This contribution is a part of the research and development work of the
// IVA Project which aims to enhance traveler information and is carried out
// under the leadership of the Technological Research Institute SystemX,
// with the partnership and support of the transport organization authority
// Ile-De-France Mobilités (IDFM), SNCF, and public funds
// under the scope of the French Program "Investissements d’Avenir".
//
// LICENCE: This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <http://www.gnu.org/licenses/>.
//
// Stay tuned using
// twitter @navitia
// channel `#navitia` on riot https://riot.im/app/#/room/#navitia:matrix.org
// https://groups.google.com/d/forum/navitia
// www.navitia.io

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{BOARD_SLACK_SECONDS, MAX_DURATION};
use crate::time::Time;

/// One accessibility profile request: a departure window on a service day,
/// swept minute by minute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileRequest {
    /// Start of the departure window, seconds since midnight.
    pub from_time: Time,

    /// End of the departure window, exclusive.
    pub to_time: Time,

    /// Service day, selects the active services.
    pub date: NaiveDate,

    /// Walking speed on transfers, meters per second.
    #[serde(default = "default_walk_speed")]
    pub walk_speed: f64,

    /// Total number of random frequency draws wanted over the whole window.
    /// They are spread over the departure minutes.
    #[serde(default = "default_monte_carlo_draws")]
    pub monte_carlo_draws: usize,

    /// Overrides the minimum dwell before boarding.
    #[serde(default)]
    pub board_slack_seconds: Option<Time>,

    /// Ceiling on exploration past the departure time. The default is large
    /// enough to never cut a search short.
    #[serde(default = "default_max_duration")]
    pub max_duration: Time,

    /// Seed for the frequency offset draws. Fixing it makes the whole sweep
    /// reproducible.
    #[serde(default)]
    pub seed: Option<u64>,
}

pub fn default_walk_speed() -> f64 {
    1.3
}

pub fn default_monte_carlo_draws() -> usize {
    200
}

pub fn default_max_duration() -> Time {
    MAX_DURATION
}

impl ProfileRequest {
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.from_time < 0 || self.to_time < self.from_time {
            return Err(RequestError::BadTimeWindow {
                from: self.from_time,
                to: self.to_time,
            });
        }
        if !(self.walk_speed > 0.0) {
            return Err(RequestError::BadWalkSpeed(self.walk_speed));
        }
        Ok(())
    }

    pub fn board_slack(&self) -> Time {
        self.board_slack_seconds.unwrap_or(BOARD_SLACK_SECONDS)
    }
}

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("bad departure window : [{from}, {to})")]
    BadTimeWindow { from: Time, to: Time },
    #[error("walk speed must be positive, got {0}")]
    BadWalkSpeed(f64),
}

/// How boarding waits on frequency services are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardingAssumption {
    /// Zero wait: a vehicle departs the moment the traveler can board.
    BestCase,
    /// A full headway is waited at every boarding.
    WorstCase,
    /// The wait implied by the current offset draw.
    Random,
}

impl std::str::FromStr for BoardingAssumption {
    type Err = BadBoardingAssumption;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use BoardingAssumption::*;
        let assumption = match s {
            "best_case" => BestCase,
            "worst_case" => WorstCase,
            "random" => Random,
            _ => {
                return Err(BadBoardingAssumption {
                    name: s.to_string(),
                })
            }
        };
        Ok(assumption)
    }
}

impl std::fmt::Display for BoardingAssumption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        use BoardingAssumption::*;
        match self {
            BestCase => write!(f, "best_case"),
            WorstCase => write!(f, "worst_case"),
            Random => write!(f, "random"),
        }
    }
}

#[derive(Debug, Error)]
#[error("bad boarding assumption given : `{name}`")]
pub struct BadBoardingAssumption {
    name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> ProfileRequest {
        ProfileRequest {
            from_time: 8 * 3600,
            to_time: 9 * 3600,
            date: NaiveDate::from_ymd(2020, 1, 1),
            walk_speed: default_walk_speed(),
            monte_carlo_draws: default_monte_carlo_draws(),
            board_slack_seconds: None,
            max_duration: default_max_duration(),
            seed: None,
        }
    }

    #[test]
    fn validation_rejects_inverted_windows_and_bad_speeds() {
        assert!(request().validate().is_ok());

        let mut inverted = request();
        inverted.to_time = inverted.from_time - 1;
        assert!(matches!(
            inverted.validate(),
            Err(RequestError::BadTimeWindow { .. })
        ));

        let mut still = request();
        still.walk_speed = 0.0;
        assert!(matches!(
            still.validate(),
            Err(RequestError::BadWalkSpeed(_))
        ));
    }

    #[test]
    fn boarding_assumption_round_trips_through_strings() {
        use std::str::FromStr;
        for assumption in [
            BoardingAssumption::BestCase,
            BoardingAssumption::WorstCase,
            BoardingAssumption::Random,
        ] {
            let parsed = BoardingAssumption::from_str(&assumption.to_string()).unwrap();
            assert_eq!(parsed, assumption);
        }
        assert!(BoardingAssumption::from_str("optimistic").is_err());
    }
}
