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

use crate::time::{Time, UNREACHED};

/// Off-network target points linked to transit stops by precomputed walks.
///
/// `stop_trees[stop]` lists the (target, walk seconds) pairs reachable from
/// that stop on the street network. Stops with no tree propagate nothing.
pub struct LinkedPointSet {
    nb_of_points: usize,
    stop_trees: Vec<Vec<(usize, Time)>>,
}

impl LinkedPointSet {
    pub fn new(nb_of_points: usize, nb_of_stops: usize) -> Self {
        Self {
            nb_of_points,
            stop_trees: vec![Vec::new(); nb_of_stops],
        }
    }

    pub fn link(&mut self, stop: usize, target: usize, walk_seconds: Time) -> &mut Self {
        debug_assert!(target < self.nb_of_points);
        debug_assert!(walk_seconds >= 0);
        self.stop_trees[stop].push((target, walk_seconds));
        self
    }

    pub fn size(&self) -> usize {
        self.nb_of_points
    }

    pub(crate) fn stop_tree(&self, stop: usize) -> &[(usize, Time)] {
        &self.stop_trees[stop]
    }
}

/// Travel time from the origin to every target point without ever boarding
/// transit, as computed by the street router.
pub struct PointSetTimes {
    times: Vec<Time>,
}

impl PointSetTimes {
    pub fn new(times: Vec<Time>) -> Self {
        Self { times }
    }

    /// A baseline where no target can be reached off-network.
    pub fn unreached(nb_of_points: usize) -> Self {
        Self {
            times: vec![UNREACHED; nb_of_points],
        }
    }

    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn travel_time_to_point(&self, point: usize) -> Time {
        self.times[point]
    }
}
