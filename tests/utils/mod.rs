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

#![allow(dead_code)]

use hugin::chrono::NaiveDate;
use hugin::tracing::dispatcher::DefaultGuard;
use hugin::tracing::level_filters::LevelFilter;
use hugin::{ProfileRequest, RangeRaptor, Time, MAX_DURATION};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[must_use]
pub fn init_test_logger() -> DefaultGuard {
    let default_level = LevelFilter::DEBUG;
    let rust_log =
        std::env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_| default_level.to_string());
    let env_filter_subscriber = EnvFilter::try_new(rust_log).unwrap_or_else(|err| {
        eprintln!(
            "invalid {}, falling back to level '{}' - {}",
            EnvFilter::DEFAULT_ENV,
            default_level,
            err,
        );
        EnvFilter::new(default_level.to_string())
    });
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .with(env_filter_subscriber)
        .set_default()
}

/// The date every test network runs on.
pub fn service_day() -> NaiveDate {
    NaiveDate::from_ymd(2020, 1, 1)
}

/// A request over `[from_time, to_time)` with quiet defaults: unit walk
/// speed, no random draws, a fixed seed.
pub fn request(from_time: Time, to_time: Time) -> ProfileRequest {
    ProfileRequest {
        from_time,
        to_time,
        date: service_day(),
        walk_speed: 1.0,
        monte_carlo_draws: 0,
        board_slack_seconds: None,
        max_duration: MAX_DURATION,
        seed: Some(0),
    }
}

/// Checks the per-round laws on the retained scheduled states: rounds only
/// ever improve, and a transfer arrival is never later than the vehicle
/// arrival it came from.
pub fn assert_state_invariants(worker: &RangeRaptor) {
    for round in 0..worker.retained_rounds() {
        let state = worker.scheduled_state(round);
        for stop in 0..state.nb_of_stops() {
            assert!(
                state.best_time(stop) <= state.best_non_transfer_time(stop),
                "stop {} of round {} : transfer family worse than vehicle family",
                stop,
                round
            );
            if round > 0 {
                let previous = worker.scheduled_state(round - 1);
                assert!(
                    state.best_time(stop) <= previous.best_time(stop),
                    "stop {} got worse from round {} to round {}",
                    stop,
                    round - 1,
                    round
                );
            }
        }
    }
}
