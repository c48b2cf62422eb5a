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

use std::cmp::max;
use std::mem;
use std::rc::Rc;
use std::time::{Duration, Instant};

use fixedbitset::FixedBitSet;
use tracing::{error, info};

use crate::engine::{RangeRaptor, SearchError, DEPARTURE_STEP_SEC};
use crate::point_set::PointSetTimes;
use crate::propagated_times::{ConfidenceCalculationMethod, PropagatedTimesStore};
use crate::raptor_state::RaptorState;
use crate::request::BoardingAssumption;
use crate::time::{Time, UNREACHED};

/// Everything a sweep produces: the per-iteration per-target elapsed-time
/// matrix, which iterations may enter averages, the summarized store, the
/// archived states in static-site mode, and the wall-clock counters.
pub struct RaptorOutput {
    pub store: PropagatedTimesStore,

    /// `[iteration][target]` elapsed seconds, `UNREACHED` preserved. Rows
    /// are ordered by strictly descending departure minute, draws within a
    /// minute in submission order.
    pub times_at_targets_each_iteration: Vec<Vec<Time>>,

    /// The bounding (best-case, worst-case) draws are excluded.
    pub include_in_averages: FixedBitSet,

    /// Final-round state of every iteration, only in static-site mode.
    pub states_each_iteration: Option<Vec<RaptorState>>,

    pub statistics: SearchStatistics,
}

#[derive(Debug, Clone, Default)]
pub struct SearchStatistics {
    /// Number of iterations over all minutes and draws.
    pub search_count: usize,
    /// Seconds between two departure minutes.
    pub time_step: Time,
    /// Wall clock spent propagating to targets.
    pub propagation: Duration,
    /// Wall clock spent in the transit searches themselves.
    pub transit_search: Duration,
}

impl<'data> RangeRaptor<'data> {
    /// Runs the full sweep: for every departure minute from the latest to
    /// the earliest, a scheduled search, its propagation, and the
    /// frequency draws layered on top, each with its own propagation.
    ///
    /// `access_times` maps stops to the seconds needed to reach them from
    /// the origin on the street network; `non_transit_times` is the
    /// walk-only baseline to every target.
    pub fn solve(
        &mut self,
        access_times: &[(usize, Time)],
        non_transit_times: &PointSetTimes,
    ) -> Result<RaptorOutput, SearchError> {
        let begin = Instant::now();

        for &(stop, access_seconds) in access_times {
            if access_seconds <= 0 {
                error!("access time to stop {} is {}", stop, access_seconds);
            }
        }

        // In static-site mode the caller propagates on its side, the sweep
        // then reports times at stops instead of times at targets.
        let do_propagation = self.targets.is_some();
        let nb_of_targets = self
            .targets
            .map_or(self.data.nb_of_stops(), |targets| targets.size());

        let minute_count = max(
            1,
            (self.req.to_time - self.req.from_time) / DEPARTURE_STEP_SEC,
        ) as usize;

        // spread the requested draw total over the minutes of the window
        let monte_carlo_draws =
            (self.req.monte_carlo_draws + minute_count - 1) / minute_count;

        // two extra iterations per minute bound the draws from both sides
        let iterations = if self.data.has_frequencies() {
            minute_count * (monte_carlo_draws + 2)
        } else {
            minute_count
        };

        let mut times_at_targets_each_iteration = vec![vec![UNREACHED; nb_of_targets]; iterations];
        let mut include_in_averages = FixedBitSet::with_capacity(iterations);

        // The scheduled propagation table survives from minute to minute
        // and is only ever lowered: stepping the departure back cannot
        // worsen any scheduled arrival.
        let mut scheduled_times_at_targets = vec![UNREACHED; nb_of_targets];

        let mut iteration = 0;
        for minute in 0..minute_count {
            let departure_time = max(
                self.req.from_time,
                self.req.to_time - DEPARTURE_STEP_SEC * (minute as Time + 1),
            );
            if minute % 15 == 0 {
                info!("minute {}", minute);
            }

            for state in &mut self.schedule_state {
                state.departure_time = departure_time;
            }

            self.run_raptor_scheduled(access_times, departure_time);

            if do_propagation {
                let spent = self.do_propagation(
                    self.schedule_state[self.round].best_non_transfer_times(),
                    &mut scheduled_times_at_targets,
                    departure_time,
                );
                self.propagation_time += spent;

                // overlay the walk-only baseline : nobody rides transit to
                // cross a block
                for (target, time) in scheduled_times_at_targets.iter_mut().enumerate() {
                    let non_transit = non_transit_times.travel_time_to_point(target);
                    if non_transit != UNREACHED {
                        let clock_time = non_transit + departure_time;
                        if clock_time < *time {
                            *time = clock_time;
                        }
                    }
                }
            }

            if self.data.has_frequencies() {
                for draw in 0..monte_carlo_draws + 2 {
                    let assumption = match draw {
                        0 => BoardingAssumption::BestCase,
                        1 => BoardingAssumption::WorstCase,
                        _ => {
                            let data = self.data;
                            self.offsets.randomize(data);
                            // only real draws enter averages, not the bounds
                            include_in_averages.set(iteration, true);
                            BoardingAssumption::Random
                        }
                    };
                    let state_copy = self.run_raptor_frequency(departure_time, assumption);

                    let row = &mut times_at_targets_each_iteration[iteration];
                    if do_propagation {
                        // the scheduled results are already propagated, only
                        // overlay what this draw improved
                        row.copy_from_slice(&scheduled_times_at_targets);
                        let spent = self.do_propagation(
                            state_copy.best_non_transfer_times(),
                            row,
                            departure_time,
                        );
                        self.propagation_time += spent;
                    } else {
                        row.copy_from_slice(state_copy.best_non_transfer_times());
                    }

                    if self.states_each_iteration.is_some() {
                        let archived = state_copy.deep_copy();
                        if let Some(archive) = &mut self.states_each_iteration {
                            archive.push(archived);
                        }
                    }

                    for time in row.iter_mut() {
                        if *time != UNREACHED {
                            *time -= departure_time;
                        }
                    }
                    iteration += 1;
                }
            } else {
                let row = &mut times_at_targets_each_iteration[iteration];
                if do_propagation {
                    row.copy_from_slice(&scheduled_times_at_targets);
                } else {
                    row.copy_from_slice(self.schedule_state[self.round].best_non_transfer_times());
                }
                for time in row.iter_mut() {
                    if *time != UNREACHED {
                        *time -= departure_time;
                    }
                }
                include_in_averages.set(iteration, true);

                if self.states_each_iteration.is_some() {
                    let archived = self.schedule_state[self.round].deep_copy();
                    if let Some(archive) = &mut self.states_each_iteration {
                        archive.push(archived);
                    }
                }
                iteration += 1;
            }
        }

        // an output matrix not filled exactly means the iteration
        // accounting is broken and every row is suspect
        if iteration != iterations {
            error!(
                "produced {} iterations for {} allocated rows",
                iteration, iterations
            );
            return Err(SearchError::IterationCountMismatch {
                produced: iteration,
                allocated: iterations,
            });
        }

        let calc_time = begin.elapsed();
        let transit_search = calc_time
            .checked_sub(self.propagation_time)
            .unwrap_or_default();
        info!("calc time {:.3}s", calc_time.as_secs_f64());
        info!("  propagation {:.3}s", self.propagation_time.as_secs_f64());
        info!("  raptor {:.3}s", transit_search.as_secs_f64());
        info!(
            "requested {} monte carlo draws, ran {}",
            self.req.monte_carlo_draws,
            monte_carlo_draws * minute_count
        );
        info!("{} rounds", self.round + 1);

        let mut store = PropagatedTimesStore::new(nb_of_targets);
        store.set_from_array(
            &times_at_targets_each_iteration,
            &include_in_averages,
            ConfidenceCalculationMethod::MinMax,
        );

        let statistics = SearchStatistics {
            search_count: iterations,
            time_step: DEPARTURE_STEP_SEC,
            propagation: self.propagation_time,
            transit_search,
        };

        Ok(RaptorOutput {
            store,
            times_at_targets_each_iteration,
            include_in_averages,
            states_each_iteration: self.states_each_iteration.take(),
            statistics,
        })
    }

    /// One scheduled search at `departure_time`, over the retained
    /// range-RAPTOR state. Frequency patterns are ignored entirely.
    pub fn run_raptor_scheduled(&mut self, access_times: &[(usize, Time)], departure_time: Time) {
        self.max_time = departure_time.saturating_add(self.req.max_duration);

        self.round = 0;
        self.patterns_touched_this_round.clear();
        self.stops_touched_this_search.clear();
        self.stops_touched_this_round.clear();

        // Zeroth round: the access walk lands on `best_times` only, like a
        // transfer. Leaving `best_non_transfer_times` untouched keeps a
        // journey from egressing at the very stop it boarded, which would
        // blow past the walk limit. Back-pointers are not cleared either.
        for &(stop, access_seconds) in access_times {
            let time = access_seconds + departure_time;
            if time < self.schedule_state[0].best_times[stop] {
                self.schedule_state[0].best_times[stop] = time;
                self.schedule_state[0].transfer_stop[stop] = None;
                self.mark_patterns_for_stop(stop);
            }
        }

        // round 1 is the first one that rides transit
        self.advance_to_next_round();
        loop {
            // the two round states leave the list while the round runs
            let input = mem::replace(&mut self.schedule_state[self.round - 1], RaptorState::new(0));
            let mut output =
                mem::replace(&mut self.schedule_state[self.round], RaptorState::new(0));
            let improved = self.do_one_round(&input, &mut output, None);
            self.schedule_state[self.round - 1] = input;
            self.schedule_state[self.round] = output;
            if !improved {
                break;
            }
            self.advance_to_next_round();
        }

        // Frequency searches must run at least one round more than any
        // scheduled search of this sweep, else a frequency leg reachable
        // only after several scheduled transfers is never explored. The
        // list length cannot serve as this bound : frequency searches
        // append empty rounds to it.
        self.scheduled_rounds = Some(
            self.scheduled_rounds
                .map_or(self.round + 1, |rounds| rounds.max(self.round + 1)),
        );

        // A search shallower than a previous minute's still refreshes every
        // retained round, keeping all of them monotone for later searches
        // that go deeper than this one did.
        while self.round < self.schedule_state.len() - 1 {
            let (current, next) = self.schedule_state.split_at_mut(self.round + 1);
            next[0].min(&current[self.round]);
            self.round += 1;
        }
    }

    /// One frequency search at `departure_time`, layered on the scheduled
    /// state. Returns the final-round state.
    ///
    /// Range-RAPTOR does not hold with frequencies: the draw at one minute
    /// says nothing about the next. The scheduled state is therefore copied
    /// at every round and the frequency results never leak back into it.
    pub fn run_raptor_frequency(
        &mut self,
        departure_time: Time,
        assumption: BoardingAssumption,
    ) -> RaptorState {
        self.max_time = departure_time.saturating_add(self.req.max_duration);

        self.round = 0;
        self.advance_to_next_round();

        self.patterns_touched_this_round.clear();
        self.stops_touched_this_search.clear();
        self.stops_touched_this_round.clear();

        // Only frequency patterns are marked up front. Scheduled patterns
        // reached downstream of them get marked during the search and are
        // explored in later rounds.
        let data = self.data;
        for (pattern_index, pattern) in data.patterns.iter().enumerate() {
            if pattern.has_frequencies {
                self.patterns_touched_this_round.set(pattern_index, true);
            }
        }

        // Round zero of the scheduled state carries the access walks; the
        // first scheduled ride serves as the bound on the first frequency
        // ride, hence the copy of round one.
        let mut previous_round = Rc::new(self.schedule_state[self.round - 1].copy());
        let mut current_round = self.schedule_state[self.round].copy();
        current_round.previous = Some(Rc::clone(&previous_round));

        // Keep going while a round improves something, and in any case for
        // at least as many rounds as the deepest scheduled search plus one,
        // so the result is never cut off at a shallower depth than the
        // scheduled bound it started from.
        loop {
            let improved = self.do_one_round(&previous_round, &mut current_round, Some(assumption));
            let forced = self
                .scheduled_rounds
                .map_or(false, |rounds| self.round <= rounds);
            if !improved && !forced {
                break;
            }

            self.advance_frequency_round(&mut previous_round, &mut current_round);
        }

        current_round
    }

    /// Steps the frequency search to its next round: the finished round
    /// becomes the previous one and the chain back-link of the new round,
    /// and the retained scheduled times of the new depth are folded in.
    fn advance_frequency_round(
        &mut self,
        previous_round: &mut Rc<RaptorState>,
        current_round: &mut RaptorState,
    ) {
        self.advance_to_next_round();

        let finished = Rc::new(mem::replace(current_round, RaptorState::new(0)));
        *current_round = finished.copy();
        current_round.previous = Some(Rc::clone(&finished));
        *previous_round = finished;

        current_round.min(&self.schedule_state[self.round]);

        // frequency patterns can be re-reached by a later scheduled leg,
        // so they are re-marked on every round of a mixed network
        if self.data.has_schedules() {
            let data = self.data;
            for (pattern_index, pattern) in data.patterns.iter().enumerate() {
                if pattern.has_frequencies {
                    self.patterns_touched_this_round.set(pattern_index, true);
                }
            }
        }
    }

    /// Propagates arrival times at transit stops out to the target points,
    /// lowering `times_at_targets` in place. Only the stops touched by the
    /// current search are visited: the table already carries everything
    /// previous searches found. Returns the wall clock spent.
    ///
    /// Propagation goes all the way to the targets rather than stopping at
    /// stops because two parallel lines out of phase halve the worst-case
    /// wait of either: the worst case at each stop separately is far worse
    /// than the worst case at a target that can walk to both.
    pub fn do_propagation(
        &self,
        times_at_transit_stops: &[Time],
        times_at_targets: &mut [Time],
        departure_time: Time,
    ) -> Duration {
        let begin = Instant::now();
        let targets = match self.targets {
            Some(targets) => targets,
            None => return Duration::default(),
        };

        for stop in self.stops_touched_this_search.ones() {
            let time_at_stop = times_at_transit_stops[stop];
            if time_at_stop == UNREACHED {
                continue;
            }
            for &(target, walk_seconds) in targets.stop_tree(stop) {
                let propagated_time = time_at_stop + walk_seconds;
                if propagated_time < departure_time {
                    error!("negative propagated time at target {}", target);
                    debug_assert!(false, "negative propagated time at target {}", target);
                }
                if times_at_targets[target] > propagated_time {
                    times_at_targets[target] = propagated_time;
                }
            }
        }

        begin.elapsed()
    }
}
