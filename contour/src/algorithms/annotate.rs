//! Operation-local annotations over a pair of operand graphs.
//!
//! Graphs and contours never change during an operation. Everything the
//! operation discovers (crossings, coincident runs, which edge starts are
//! shared, whether each contour is filled or a hole) is recorded here,
//! keyed by handles, and dropped together with the `Annotations` value.

use crate::algorithms::contour::{horizontal_ray, Inside};
use crate::algorithms::crossing::{crosses_at_point, ContourKey, Crossing, CrossingId, EdgeKey, Operand};
use crate::algorithms::graph::Operands;
use crate::algorithms::overlap::ContourOverlap;
use crate::geometry::intersect::intersect_curves;
use crate::geometry::tolerance::EPS_BOUNDS;
use crate::model::Vec2;

// Parameter used to pick a start point when every edge start is shared
const FALLBACK_START_PARAMETER: f64 = 0.5;
// Past the end of any edge
const NO_STOP_LIMIT: f64 = 2.0;

/// One value per edge of both operands.
#[derive(Clone, Debug)]
struct EdgeTable<T> {
    cells: [Vec<Vec<T>>; 2],
}

impl<T: Clone + Default> EdgeTable<T> {
    fn new(ops: &Operands) -> Self {
        let shape = |operand: Operand| -> Vec<Vec<T>> {
            ops.graph(operand).contours().iter().map(|c| vec![T::default(); c.len()]).collect()
        };
        Self { cells: [shape(Operand::Subject), shape(Operand::Clip)] }
    }

    fn get(&self, key: EdgeKey) -> &T {
        &self.cells[key.operand.slot()][key.contour][key.edge]
    }

    fn get_mut(&mut self, key: EdgeKey) -> &mut T {
        &mut self.cells[key.operand.slot()][key.contour][key.edge]
    }
}

pub struct Annotations<'a> {
    ops: Operands<'a>,
    arena: Vec<Crossing>,
    crossings: EdgeTable<Vec<CrossingId>>,
    start_shared: EdgeTable<bool>,
    overlaps: Vec<ContourOverlap>,
    insides: [Vec<Inside>; 2],
}

impl<'a> Annotations<'a> {
    pub fn new(ops: Operands<'a>) -> Self {
        let insides = [
            vec![Inside::Filled; ops.subject.contour_count()],
            vec![Inside::Filled; ops.clip.contour_count()],
        ];
        Self {
            ops,
            arena: Vec::new(),
            crossings: EdgeTable::new(&ops),
            start_shared: EdgeTable::new(&ops),
            overlaps: Vec::new(),
            insides,
        }
    }

    pub fn ops(&self) -> Operands<'a> {
        self.ops
    }

    // ---- crossing storage ----

    pub fn crossing(&self, id: CrossingId) -> &Crossing {
        &self.arena[id.0]
    }

    pub fn counterpart(&self, id: CrossingId) -> CrossingId {
        self.arena[id.0].counterpart
    }

    /// Crossings on one edge, ordered by parameter.
    pub fn crossings_on(&self, edge: EdgeKey) -> &[CrossingId] {
        self.crossings.get(edge)
    }

    /// Every crossing still attached to an edge, subject first.
    pub fn crossing_ids(&self) -> impl Iterator<Item = CrossingId> + '_ {
        self.crossings.cells.iter().flatten().flatten().flatten().copied()
    }

    pub fn crossing_count(&self) -> usize {
        self.crossing_ids().count()
    }

    fn contour_crossings(&self, key: ContourKey) -> impl Iterator<Item = CrossingId> + '_ {
        self.ops.edge_keys(key).flat_map(move |e| self.crossings.get(e).iter().copied())
    }

    fn is_attached(&self, id: CrossingId) -> bool {
        self.crossings.get(self.arena[id.0].edge).contains(&id)
    }

    fn attach(&mut self, id: CrossingId) {
        let arena = &self.arena;
        let crossing = &arena[id.0];
        let list = self.crossings.get_mut(crossing.edge);
        let at = list.partition_point(|c| arena[c.0].parameter <= crossing.parameter);
        list.insert(at, id);
    }

    /// Remove a crossing and its counterpart from their edges.
    fn detach_pair(&mut self, id: CrossingId) {
        let other = self.counterpart(id);
        for c in [id, other] {
            let edge = self.arena[c.0].edge;
            self.crossings.get_mut(edge).retain(|x| *x != c);
        }
    }

    fn add_pair(&mut self, edge1: EdgeKey, t1: f64, edge2: EdgeKey, t2: f64, self_crossing: bool, from_overlap: bool) {
        let id1 = CrossingId(self.arena.len());
        let id2 = CrossingId(id1.0 + 1);
        let location = self.ops.curve(edge1).eval(t1);
        for (edge, parameter, counterpart) in [(edge1, t1, id2), (edge2, t2, id1)] {
            self.arena.push(Crossing {
                edge,
                curve: *self.ops.curve(edge),
                parameter,
                location,
                counterpart,
                entry: false,
                processed: false,
                self_crossing,
                from_overlap,
            });
        }
        self.attach(id1);
        self.attach(id2);
    }

    pub fn is_start_shared(&self, edge: EdgeKey) -> bool {
        *self.start_shared.get(edge)
    }

    fn mark_shared(&mut self, edge: EdgeKey, at_start: bool, at_stop: bool) {
        if at_start {
            *self.start_shared.get_mut(edge) = true;
        }
        if at_stop {
            let next = self.ops.next_edge(edge);
            *self.start_shared.get_mut(next) = true;
        }
    }

    // ---- insertion ----

    /// Crossings and overlaps between every subject contour and every clip
    /// contour.
    pub fn insert_crossings(&mut self) {
        let ops = self.ops;
        for c1 in ops.contour_keys(Operand::Subject) {
            for c2 in ops.contour_keys(Operand::Clip) {
                if !ops.contour(c1).bounding_rect().overlaps(&ops.contour(c2).bounding_rect()) {
                    continue;
                }
                let mut overlap = ContourOverlap::default();
                for e1 in ops.edge_keys(c1) {
                    for e2 in ops.edge_keys(c2) {
                        let found = intersect_curves(ops.curve(e1), ops.curve(e2));
                        for hit in &found.points {
                            self.mark_shared(e1, hit.is_at_start_of_curve1(), hit.is_at_stop_of_curve1());
                            self.mark_shared(e2, hit.is_at_start_of_curve2(), hit.is_at_stop_of_curve2());
                            if crosses_at_point(&ops.view(e1), &ops.view(e2), hit) {
                                self.add_pair(e1, hit.t1, e2, hit.t2, false, false);
                            }
                        }
                        if let Some(range) = found.range {
                            self.mark_shared(e1, range.is_at_start_of_curve1(), range.is_at_stop_of_curve1());
                            self.mark_shared(e2, range.is_at_start_of_curve2(), range.is_at_stop_of_curve2());
                            overlap.add_overlap(range, e1, e2, &ops);
                        }
                    }
                }
                if overlap.is_empty() {
                    continue;
                }
                overlap.join_runs(&ops);
                if !overlap.is_complete(&ops) {
                    for run in overlap.runs() {
                        if !run.is_crossing(&ops) {
                            continue;
                        }
                        if let Some((e1, t1, e2, t2)) = run.start() {
                            self.add_pair(e1, t1, e2, t2, false, true);
                        }
                    }
                }
                self.overlaps.push(overlap);
            }
        }
    }

    /// Crossings between distinct contours of one operand, then the inside
    /// classification of each of its contours (which needs them).
    pub fn insert_self_crossings(&mut self, operand: Operand) {
        let ops = self.ops;
        let keys: Vec<ContourKey> = ops.contour_keys(operand).collect();
        for (i, &c1) in keys.iter().enumerate() {
            for &c2 in &keys[i + 1..] {
                let (a, b) = (ops.contour(c1), ops.contour(c2));
                if !a.bounding_rect().overlaps(&b.bounding_rect()) || !a.bounds().overlaps(&b.bounds()) {
                    continue;
                }
                for e1 in ops.edge_keys(c1) {
                    for e2 in ops.edge_keys(c2) {
                        let found = intersect_curves(ops.curve(e1), ops.curve(e2));
                        for hit in &found.points {
                            let start1 = hit.is_at_start_of_curve1();
                            let start2 = hit.is_at_start_of_curve2();
                            self.mark_shared(e1, start1, !start1 && hit.is_at_stop_of_curve1());
                            self.mark_shared(e2, start2, !start2 && hit.is_at_stop_of_curve2());
                            if crosses_at_point(&ops.view(e1), &ops.view(e2), hit) {
                                self.add_pair(e1, hit.t1, e2, hit.t2, true, false);
                            }
                        }
                    }
                }
            }
        }

        for key in keys {
            let inside = self.contour_insides(key);
            tracing::trace!(?key, ?inside, "classified contour");
            self.insides[operand.slot()][key.contour] = inside;
        }
    }

    // ---- cleanup ----

    /// Drop the second copy of crossings found twice at a shared vertex,
    /// then crossings lying inside coincident runs.
    pub fn cleanup(&mut self) {
        for operand in [Operand::Subject, Operand::Clip] {
            self.remove_duplicate_crossings(operand);
        }
        for operand in [Operand::Subject, Operand::Clip] {
            self.remove_crossings_in_overlaps(operand);
        }
        for c1 in self.ops.contour_keys(Operand::Subject) {
            for c2 in self.ops.contour_keys(Operand::Clip) {
                let count = self.crossings_between(c1, c2);
                if count % 2 == 1 {
                    tracing::warn!(?c1, ?c2, count, "odd crossing count between contours; entry/exit may not alternate");
                }
            }
        }
    }

    /// Crossings on `a` whose counterpart lies on `b`.
    pub fn crossings_between(&self, a: ContourKey, b: ContourKey) -> usize {
        self.ops
            .edge_keys(a)
            .flat_map(|e| self.crossings.get(e).iter())
            .filter(|&&id| self.crossing(self.counterpart(id)).edge.contour_key() == b)
            .count()
    }

    fn edge_keys_of(&self, operand: Operand) -> Vec<EdgeKey> {
        let ops = self.ops;
        ops.contour_keys(operand).flat_map(move |c| ops.edge_keys(c)).collect()
    }

    fn same_site(&self, a: CrossingId, b: CrossingId) -> bool {
        let (ca, cb) = (self.crossing(a), self.crossing(b));
        let other_a = self.crossing(ca.counterpart).edge.contour_key();
        let other_b = self.crossing(cb.counterpart).edge.contour_key();
        other_a == other_b && ca.self_crossing == cb.self_crossing && ca.location.is_close(cb.location, EPS_BOUNDS)
    }

    fn remove_duplicate_crossings(&mut self, operand: Operand) {
        for edge in self.edge_keys_of(operand) {
            let snapshot = self.crossings.get(edge).clone();
            for id in snapshot {
                if !self.is_attached(id) {
                    continue;
                }
                if self.crossing(id).is_at_start() {
                    let previous = self.ops.previous_edge(edge);
                    if let Some(&last) = self.crossings.get(previous).last() {
                        if last != id && self.crossing(last).is_at_end() && self.same_site(id, last) {
                            let victim = if self.crossing(id).from_overlap && !self.crossing(last).from_overlap { last } else { id };
                            self.detach_pair(victim);
                            if victim == id {
                                continue;
                            }
                        }
                    }
                }
                if self.crossing(id).is_at_end() {
                    let next = self.ops.next_edge(edge);
                    if let Some(&first) = self.crossings.get(next).first() {
                        if first != id && self.crossing(first).is_at_start() && self.same_site(id, first) {
                            let victim = if self.crossing(first).from_overlap && !self.crossing(id).from_overlap { id } else { first };
                            self.detach_pair(victim);
                        }
                    }
                }
            }
        }
    }

    fn remove_crossings_in_overlaps(&mut self, operand: Operand) {
        for edge in self.edge_keys_of(operand) {
            let snapshot = self.crossings.get(edge).clone();
            for id in snapshot {
                if !self.is_attached(id) || self.crossing(id).from_overlap {
                    continue;
                }
                let crossing = self.crossing(id);
                if self.overlaps.iter().any(|o| o.does_contain_crossing(crossing)) {
                    self.detach_pair(id);
                }
            }
        }
    }

    // ---- overlaps and equivalence ----

    pub fn overlaps(&self) -> &[ContourOverlap] {
        &self.overlaps
    }

    pub fn overlaps_between(&self, a: ContourKey, b: ContourKey) -> impl Iterator<Item = &ContourOverlap> + '_ {
        self.overlaps.iter().filter(move |o| o.is_between(a, b))
    }

    pub fn does_overlap_contain_parameter(&self, parameter: f64, edge: EdgeKey) -> bool {
        self.overlaps.iter().any(|o| o.does_contain_parameter(parameter, edge))
    }

    /// The two contours trace the same outline.
    pub fn is_equivalent(&self, a: ContourKey, b: ContourKey) -> bool {
        self.overlaps_between(a, b).any(|o| o.is_complete(&self.ops))
    }

    // ---- classification ----

    pub fn inside(&self, key: ContourKey) -> Inside {
        self.insides[key.operand.slot()][key.contour]
    }

    /// First edge whose start touches nothing else.
    fn start_edge(&self, key: ContourKey) -> EdgeKey {
        let first = EdgeKey::new(key, 0);
        let mut edge = first;
        while self.is_start_shared(edge) {
            edge = self.ops.next_edge(edge);
            if edge == first {
                tracing::warn!(?key, "every edge start is shared; start point may be ambiguous");
                break;
            }
        }
        edge
    }

    /// A point of the contour that lies on no other contour, with the edge
    /// and parameter it sits at.
    pub fn starting_point(&self, key: ContourKey) -> (EdgeKey, f64, Vec2) {
        let mut edge = self.start_edge(key);
        if !self.is_start_shared(edge) {
            return (edge, 0.0, self.ops.curve(edge).p0);
        }
        let stop = edge;
        while self.does_overlap_contain_parameter(FALLBACK_START_PARAMETER, edge) {
            edge = self.ops.next_edge(edge);
            if edge == stop {
                tracing::warn!(?key, "contour lies entirely inside overlaps; start point may be ambiguous");
                break;
            }
        }
        (edge, FALLBACK_START_PARAMETER, self.ops.curve(edge).eval(FALLBACK_START_PARAMETER))
    }

    pub fn test_point(&self, key: ContourKey) -> Vec2 {
        self.starting_point(key).2
    }

    /// Hole when a ray from the contour out past the whole graph crosses the
    /// other contours an odd number of times.
    fn contour_insides(&self, key: ContourKey) -> Inside {
        let graph = self.ops.graph(key.operand);
        let ray = horizontal_ray(self.test_point(key), &graph.bounds());
        let mut count = 0;
        for other in self.ops.contour_keys(key.operand) {
            if other == key || self.crosses_own_contour(other, key) {
                continue;
            }
            count += self.ops.contour(other).intersections_with_ray(&ray);
        }
        if count % 2 == 1 { Inside::Hole } else { Inside::Filled }
    }

    /// `contour` has a self crossing with `other`.
    pub fn crosses_own_contour(&self, contour: ContourKey, other: ContourKey) -> bool {
        self.contour_crossings(contour).any(|id| {
            let c = self.crossing(id);
            c.self_crossing && self.crossing(c.counterpart).edge.contour_key() == other
        })
    }

    /// Contours of the same graph reachable from `key` through self crossings.
    pub fn self_intersecting_contours(&self, key: ContourKey) -> Vec<ContourKey> {
        let mut found: Vec<ContourKey> = Vec::new();
        let mut pending = vec![key];
        while let Some(current) = pending.pop() {
            for id in self.contour_crossings(current) {
                let c = self.crossing(id);
                if !c.self_crossing {
                    continue;
                }
                let other = self.crossing(c.counterpart).edge.contour_key();
                if other != key && !found.contains(&other) {
                    found.push(other);
                    pending.push(other);
                }
            }
        }
        found
    }

    /// Contours of the other operand this one crosses.
    pub fn intersecting_contours(&self, key: ContourKey) -> Vec<ContourKey> {
        let mut found: Vec<ContourKey> = Vec::new();
        for id in self.contour_crossings(key) {
            let c = self.crossing(id);
            if c.self_crossing {
                continue;
            }
            let other = self.crossing(c.counterpart).edge.contour_key();
            if !found.contains(&other) {
                found.push(other);
            }
        }
        found
    }

    /// Contours of `operand` without a single crossing against the other
    /// operand.
    pub fn nonintersecting_contours(&self, operand: Operand) -> Vec<ContourKey> {
        self.ops
            .contour_keys(operand)
            .filter(|&k| self.intersecting_contours(k).is_empty())
            .collect()
    }

    fn contour_and_self_intersecting_contain_point(&self, key: ContourKey, point: Vec2) -> bool {
        let containers = std::iter::once(key)
            .chain(self.self_intersecting_contours(key))
            .filter(|&k| self.ops.contour(k).contains_point(point))
            .count();
        containers % 2 == 1
    }

    // ---- entry / exit ----

    /// Mark every crossing of `operand` as entry or exit. `mark_inside`
    /// keeps the parts inside the other operand, otherwise the parts
    /// outside it.
    pub fn mark_entry_exit(&mut self, operand: Operand, mark_inside: bool) {
        let ops = self.ops;
        for key in ops.contour_keys(operand) {
            for other in self.intersecting_contours(key) {
                let inside = if self.inside(other) == Inside::Hole { !mark_inside } else { mark_inside };
                self.mark_contour(key, other, inside);
            }
        }
    }

    fn mark_contour(&mut self, key: ContourKey, other: ContourKey, mark_inside: bool) {
        let (start, parameter, point) = self.starting_point(key);
        let contains = self.contour_and_self_intersecting_contain_point(other, point);
        let mut entry = if mark_inside { !contains } else { contains };
        tracing::trace!(?key, ?other, contains, entry, "entry/exit seed");

        let mut targets = self.self_intersecting_contours(other);
        targets.push(other);

        entry = self.mark_on_edge(start, parameter, NO_STOP_LIMIT, &targets, entry);
        let mut edge = self.ops.next_edge(start);
        while edge != start {
            entry = self.mark_on_edge(edge, 0.0, NO_STOP_LIMIT, &targets, entry);
            edge = self.ops.next_edge(edge);
        }
        self.mark_on_edge(start, 0.0, parameter, &targets, entry);
    }

    fn mark_on_edge(&mut self, edge: EdgeKey, start: f64, stop: f64, targets: &[ContourKey], mut entry: bool) -> bool {
        let arena = &mut self.arena;
        for &id in self.crossings.get(edge) {
            let crossing = &arena[id.0];
            let target = arena[crossing.counterpart.0].edge.contour_key();
            if crossing.self_crossing || !targets.contains(&target) {
                continue;
            }
            if crossing.parameter < start || crossing.parameter >= stop {
                continue;
            }
            arena[id.0].entry = entry;
            entry = !entry;
        }
        entry
    }

    // ---- walk support ----

    fn position(&self, id: CrossingId) -> Option<usize> {
        self.crossings.get(self.crossing(id).edge).iter().position(|c| *c == id)
    }

    pub fn next_nonself(&self, id: CrossingId) -> Option<CrossingId> {
        let list = self.crossings.get(self.crossing(id).edge);
        let at = self.position(id)?;
        list[at + 1..].iter().copied().find(|c| !self.crossing(*c).self_crossing)
    }

    pub fn previous_nonself(&self, id: CrossingId) -> Option<CrossingId> {
        let list = self.crossings.get(self.crossing(id).edge);
        let at = self.position(id)?;
        list[..at].iter().rev().copied().find(|c| !self.crossing(*c).self_crossing)
    }

    pub fn first_nonself(&self, edge: EdgeKey) -> Option<CrossingId> {
        self.crossings.get(edge).iter().copied().find(|c| !self.crossing(*c).self_crossing)
    }

    pub fn last_nonself(&self, edge: EdgeKey) -> Option<CrossingId> {
        self.crossings.get(edge).iter().rev().copied().find(|c| !self.crossing(*c).self_crossing)
    }

    pub fn has_nonself(&self, edge: EdgeKey) -> bool {
        self.first_nonself(edge).is_some()
    }

    pub fn first_unprocessed(&self, operand: Operand) -> Option<CrossingId> {
        self.crossings.cells[operand.slot()]
            .iter()
            .flatten()
            .flatten()
            .copied()
            .find(|c| {
                let crossing = self.crossing(*c);
                !crossing.self_crossing && !crossing.processed
            })
    }

    pub fn set_processed(&mut self, id: CrossingId) {
        self.arena[id.0].processed = true;
    }
}
