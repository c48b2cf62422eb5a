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

//! Round-based transit accessibility engine.
//!
//! The core of the crate is [`RangeRaptor`], an earliest-arrival RAPTOR
//! search swept across a window of departure minutes (range-RAPTOR), with
//! frequency-based services handled by Monte Carlo draws of boarding
//! offsets, and arrival times propagated to a fixed set of off-network
//! target points.
//!
//! The timetable is consumed as an immutable, flattened [`TransitData`];
//! street-network access and egress times are inputs computed elsewhere.

pub mod engine;
pub mod frequency_offsets;
pub mod point_set;
pub mod propagated_times;
pub mod raptor_state;
pub mod request;
pub mod time;
pub mod transit_data;

pub use chrono;
pub use tracing;

pub use engine::{
    RangeRaptor, RaptorOutput, SearchError, SearchStatistics, BOARD_SLACK_SECONDS,
    DEPARTURE_STEP_SEC, MAX_DURATION,
};
pub use frequency_offsets::FrequencyOffsets;
pub use point_set::{LinkedPointSet, PointSetTimes};
pub use propagated_times::{ConfidenceCalculationMethod, PropagatedTimesStore};
pub use raptor_state::RaptorState;
pub use request::{BoardingAssumption, ProfileRequest, RequestError};
pub use time::{Time, UNREACHED};
pub use transit_data::{TransitData, TransitDataBuilder};
