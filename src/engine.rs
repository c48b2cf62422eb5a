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

mod round;
mod sweep;

pub use sweep::{RaptorOutput, SearchStatistics};

use std::time::Duration;

use fixedbitset::FixedBitSet;
use thiserror::Error;

use crate::frequency_offsets::FrequencyOffsets;
use crate::point_set::LinkedPointSet;
use crate::raptor_state::RaptorState;
use crate::request::{ProfileRequest, RequestError};
use crate::time::Time;
use crate::transit_data::TransitData;

/// Minimum dwell between arriving at a stop and boarding a vehicle there.
pub const BOARD_SLACK_SECONDS: Time = 60;

/// Spacing between the departure times of the sweep.
pub const DEPARTURE_STEP_SEC: Time = 60;

/// Default exploration ceiling past the departure time. Large enough to
/// keep the cutoff effectively off while leaving room for clock times up
/// to two days past midnight.
pub const MAX_DURATION: Time = Time::MAX - 48 * 3600;

/// A round-based earliest-arrival search over one departure window.
///
/// The worker sweeps departure minutes from the latest to the earliest and
/// reuses one list of per-round states across all of them: an earlier
/// departure can only improve arrivals, so the retained state is a valid
/// starting bound for the next minute. Frequency draws layer on copies of
/// that state and never write back into it.
///
/// One state per round is kept, not a single best-known vector. With a
/// single vector a search can ride several vehicles within one round:
/// a line riding away from the destination can be boarded, left, and the
/// trip it would have caught at the origin caught downstream, producing
/// valid but absurd paths. Separate rounds keep one boarding per round.
///
/// A worker runs exactly one `solve` and is then exhausted, like the
/// request types it consumes.
pub struct RangeRaptor<'data> {
    pub(crate) data: &'data TransitData,
    pub(crate) targets: Option<&'data LinkedPointSet>,
    pub(crate) req: ProfileRequest,

    /// Services running on the requested day.
    pub(crate) services_active: FixedBitSet,

    /// One state per round of the scheduled search, shared by every
    /// departure minute of the sweep. Grows when a search goes deeper than
    /// any search before it, never shrinks.
    pub(crate) schedule_state: Vec<RaptorState>,

    /// Patterns to scan in the current round. Rebuilt by the transfers
    /// pass at the end of every round.
    pub(crate) patterns_touched_this_round: FixedBitSet,

    /// Stops improved in the current round. Cleared at the top of every
    /// round; feeds the transfers pass.
    pub(crate) stops_touched_this_round: FixedBitSet,

    /// Stops improved at any round of the current search. Cleared at the
    /// start of each scheduled or frequency search, never between rounds.
    /// Propagation reads exactly this set: the target table already holds
    /// the results of previous searches, only the stops this search
    /// touched can improve it.
    pub(crate) stops_touched_this_search: FixedBitSet,

    pub(crate) offsets: FrequencyOffsets,

    pub(crate) round: usize,

    /// Deepest round count any scheduled search of this sweep reached,
    /// `None` before the first one.
    pub(crate) scheduled_rounds: Option<usize>,

    /// No arrival past this clock time is considered.
    pub(crate) max_time: Time,

    pub(crate) board_slack: Time,

    /// Wall clock spent in propagation, for the end-of-sweep statistics.
    pub(crate) propagation_time: Duration,

    /// Final-round state of every iteration, archived only in static-site
    /// mode (no targets): with targets the per-iteration states are of no
    /// use and hold a lot of memory.
    pub(crate) states_each_iteration: Option<Vec<RaptorState>>,
}

impl<'data> RangeRaptor<'data> {
    pub fn new(
        data: &'data TransitData,
        targets: Option<&'data LinkedPointSet>,
        req: ProfileRequest,
    ) -> Result<Self, RequestError> {
        req.validate()?;
        let nb_of_stops = data.nb_of_stops();
        let offsets = match req.seed {
            Some(seed) => FrequencyOffsets::with_seed(data, seed),
            None => FrequencyOffsets::new(data),
        };
        let services_active = data.active_services_on(req.date);
        let board_slack = req.board_slack();
        Ok(Self {
            data,
            targets,
            services_active,
            schedule_state: vec![RaptorState::new(nb_of_stops)],
            patterns_touched_this_round: FixedBitSet::with_capacity(data.nb_of_patterns()),
            stops_touched_this_round: FixedBitSet::with_capacity(nb_of_stops),
            stops_touched_this_search: FixedBitSet::with_capacity(nb_of_stops),
            offsets,
            round: 0,
            scheduled_rounds: None,
            max_time: 0,
            board_slack,
            propagation_time: Duration::default(),
            states_each_iteration: if targets.is_none() {
                Some(Vec::new())
            } else {
                None
            },
            req,
        })
    }

    /// Prepare the next round, creating its state if no search of this
    /// sweep has been that deep before, else folding the current round's
    /// times into the retained one. Called by both kinds of search; a
    /// frequency search can be deeper than the scheduled one and still
    /// needs a scheduled state to copy at every round.
    pub(crate) fn advance_to_next_round(&mut self) {
        if self.schedule_state.len() == self.round + 1 {
            let next = self.schedule_state[self.round].copy();
            self.schedule_state.push(next);
        } else {
            let (current, next) = self.schedule_state.split_at_mut(self.round + 1);
            next[0].min(&current[self.round]);
        }
        self.round += 1;
    }

    /// Mark all the patterns passing through `stop` for the next round.
    pub(crate) fn mark_patterns_for_stop(&mut self, stop: usize) {
        let data = self.data;
        for &pattern in &data.stop_data(stop).patterns {
            self.patterns_touched_this_round.set(pattern, true);
        }
    }

    /// Round the latest search settled in.
    pub fn current_round(&self) -> usize {
        self.round
    }

    /// Deepest round count reached by a scheduled search so far.
    pub fn scheduled_rounds(&self) -> Option<usize> {
        self.scheduled_rounds
    }

    /// The retained scheduled state of a round, for diagnostics and tests.
    pub fn scheduled_state(&self, round: usize) -> &RaptorState {
        &self.schedule_state[round]
    }

    /// How many per-round states the sweep has retained so far.
    pub fn retained_rounds(&self) -> usize {
        self.schedule_state.len()
    }
}

pub(crate) fn intersects(left: &FixedBitSet, right: &FixedBitSet) -> bool {
    left.intersection(right).next().is_some()
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// The sweep did not fill its output matrix exactly. This means a bug
    /// in the iteration accounting and the results are garbage.
    #[error("iterations did not completely fill the output matrix : produced {produced}, allocated {allocated}")]
    IterationCountMismatch { produced: usize, allocated: usize },
}
