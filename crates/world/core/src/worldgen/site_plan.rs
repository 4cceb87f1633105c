//! Deterministic per-macro settlement placement.
//!
//! Each macro cell gets a site plan computed once and cached in
//! `macro.site_plan`; callers always receive it by value so a cached plan
//! can never be mutated through a reference.
//!
//! Placement runs tier-by-tier (metropolis, city, towns, then alternating
//! hamlet/outpost) under two constraints: a candidate center must land on an
//! unoccupied cell, and its Chebyshev distance to every already-placed
//! cluster must be at least the spacing of the larger tier involved. Every
//! placement attempt advances an `epoch` counter that keys a fresh RNG
//! stream, so a failed attempt cannot perturb the draws of a later one.

use crate::catalog::{Catalogs, SettlementKind};
use crate::rng::{KeyedRng, rnd_int};
use crate::state::world::{
    CellOffset, ClusterCaps, Dims, MacroCell, PlanMeta, PlannedCluster, SitePlan, WorldModel,
};

/// Chebyshev distance between two offsets.
pub fn chebyshev(a: CellOffset, b: CellOffset) -> i32 {
    (a.lx - b.lx).abs().max((a.ly - b.ly).abs())
}

/// Returns the macro's site plan, computing and caching it on first access.
pub fn ensure_site_plan(
    world: &mut WorldModel,
    seed: u32,
    mx: i32,
    my: i32,
    catalogs: &Catalogs,
) -> SitePlan {
    let key = MacroCell::key(mx, my);
    if let Some(entry) = world.macro_map.get(&key)
        && let Some(plan) = &entry.site_plan
    {
        return plan.clone();
    }
    let (l1, caps) = world
        .macro_map
        .get(&key)
        .map(|m| (m.l1, m.caps))
        .unwrap_or((world.l1_default, ClusterCaps::default()));
    let plan = plan_sites(seed, mx, my, l1, caps, catalogs);
    if let Some(entry) = world.macro_map.get_mut(&key) {
        entry.site_plan = Some(plan.clone());
    }
    plan
}

/// Computes the site plan for one macro cell.
pub fn plan_sites(
    seed: u32,
    mx: i32,
    my: i32,
    l1: Dims,
    caps: ClusterCaps,
    catalogs: &Catalogs,
) -> SitePlan {
    let target = rnd_int(seed, &["target", &mx.to_string(), &my.to_string()], 7, 11) as u32;

    let mut planner = Planner {
        seed,
        mx,
        my,
        l1,
        catalogs,
        occupied: vec![false; (l1.w * l1.h) as usize],
        clusters: Vec::new(),
        epoch: 0,
    };

    for _ in 0..caps.metropolis {
        planner.try_place(SettlementKind::Metropolis);
    }
    for _ in 0..caps.city {
        planner.try_place(SettlementKind::City);
    }

    let mut town_attempts = 0;
    while (planner.clusters.len() as u32) < target && town_attempts < 200 {
        town_attempts += 1;
        planner.try_place(SettlementKind::Town);
    }

    let mut flip = SettlementKind::Hamlet;
    let mut small_attempts = 0;
    let small_budget = 2 * l1.w * l1.h;
    while (planner.clusters.len() as u32) < target && small_attempts < small_budget {
        small_attempts += 1;
        planner.try_place(flip);
        flip = if flip == SettlementKind::Hamlet {
            SettlementKind::Outpost
        } else {
            SettlementKind::Hamlet
        };
    }

    let placed = planner.clusters.len() as u32;
    SitePlan {
        clusters: planner.clusters,
        meta: PlanMeta {
            target,
            placed,
            warn_shortfall: placed < target,
        },
    }
}

struct Planner<'a> {
    seed: u32,
    mx: i32,
    my: i32,
    l1: Dims,
    catalogs: &'a Catalogs,
    occupied: Vec<bool>,
    clusters: Vec<PlannedCluster>,
    epoch: u32,
}

impl Planner<'_> {
    fn index(&self, lx: i32, ly: i32) -> usize {
        (ly * self.l1.w + lx) as usize
    }

    fn is_free(&self, lx: i32, ly: i32) -> bool {
        lx >= 0 && ly >= 0 && lx < self.l1.w && ly < self.l1.h && !self.occupied[self.index(lx, ly)]
    }

    /// Attempts one placement for `tier`, consuming a fresh epoch stream.
    fn try_place(&mut self, tier: SettlementKind) -> bool {
        self.epoch += 1;
        let mut rng = KeyedRng::new(
            self.seed,
            &[
                "plan",
                &self.mx.to_string(),
                &self.my.to_string(),
                &self.epoch.to_string(),
            ],
        );

        for _ in 0..80 {
            let lx = rng.next_range(0, i64::from(self.l1.w - 1)) as i32;
            let ly = rng.next_range(0, i64::from(self.l1.h - 1)) as i32;
            let center = CellOffset { lx, ly };
            if !self.is_free(lx, ly) || !self.spacing_ok(center, tier) {
                continue;
            }

            let cells = self.grow_footprint(center, tier, &mut rng);
            let seg_index = self.clusters.len() as u32;
            self.clusters.push(PlannedCluster {
                cluster_id: format!("{}x{}_{}", self.mx, self.my, seg_index),
                seg_index,
                tier,
                center,
                cells,
            });
            return true;
        }
        false
    }

    /// Spacing holds when the distance to every placed cluster is at least
    /// the spacing of the larger of the two tiers.
    fn spacing_ok(&self, center: CellOffset, tier: SettlementKind) -> bool {
        self.clusters.iter().all(|existing| {
            let governing = existing.tier.max(tier);
            let spacing = self.catalogs.settlement_spec(governing).spacing as i32;
            chebyshev(existing.center, center) >= spacing
        })
    }

    /// Grows the cluster footprint by breadth-random expansion in the four
    /// cardinal directions, up to 200 attempts.
    fn grow_footprint(
        &mut self,
        center: CellOffset,
        tier: SettlementKind,
        rng: &mut KeyedRng,
    ) -> Vec<CellOffset> {
        const DIRS: [(i32, i32); 4] = [(0, -1), (0, 1), (-1, 0), (1, 0)];

        let footprint = self.catalogs.settlement_spec(tier).footprint as usize;
        let mut cells = vec![center];
        let idx = self.index(center.lx, center.ly);
        self.occupied[idx] = true;

        let mut attempts = 0;
        while cells.len() < footprint && attempts < 200 {
            attempts += 1;
            let base = cells[rng.next_range(0, (cells.len() - 1) as i64) as usize];
            let (dx, dy) = DIRS[rng.next_range(0, 3) as usize];
            let (nx, ny) = (base.lx + dx, base.ly + dy);
            if self.is_free(nx, ny) {
                let idx = self.index(nx, ny);
                self.occupied[idx] = true;
                cells.push(CellOffset { lx: nx, ly: ny });
            }
        }
        cells
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims() -> Dims {
        Dims { w: 12, h: 12 }
    }

    #[test]
    fn plans_are_deterministic() {
        let catalogs = world_content::catalogs();
        let a = plan_sites(9001, 2, 3, dims(), ClusterCaps::default(), &catalogs);
        let b = plan_sites(9001, 2, 3, dims(), ClusterCaps::default(), &catalogs);
        assert_eq!(a, b);
    }

    #[test]
    fn spacing_invariant_holds_or_shortfall_is_flagged() {
        let catalogs = world_content::catalogs();
        for seed in [1u32, 7, 42, 9001, 123_456] {
            let plan = plan_sites(seed, 0, 0, dims(), ClusterCaps::default(), &catalogs);
            for (i, a) in plan.clusters.iter().enumerate() {
                for b in plan.clusters.iter().skip(i + 1) {
                    let governing = a.tier.max(b.tier);
                    let spacing = catalogs.settlement_spec(governing).spacing as i32;
                    assert!(
                        chebyshev(a.center, b.center) >= spacing,
                        "seed {seed}: {} and {} too close",
                        a.cluster_id,
                        b.cluster_id
                    );
                }
            }
            if plan.meta.warn_shortfall {
                assert!(!plan.clusters.is_empty());
                assert!(plan.meta.placed < plan.meta.target);
            }
        }
    }

    #[test]
    fn caps_limit_city_and_metropolis_counts() {
        let catalogs = world_content::catalogs();
        for seed in 0..20u32 {
            let plan = plan_sites(seed, 1, 1, dims(), ClusterCaps::default(), &catalogs);
            let cities = plan
                .clusters
                .iter()
                .filter(|c| c.tier == SettlementKind::City)
                .count();
            let metros = plan
                .clusters
                .iter()
                .filter(|c| c.tier == SettlementKind::Metropolis)
                .count();
            assert!(cities <= 1);
            assert_eq!(metros, 0);
        }
    }

    #[test]
    fn cluster_ids_follow_placement_order() {
        let catalogs = world_content::catalogs();
        let plan = plan_sites(5, 4, 6, dims(), ClusterCaps::default(), &catalogs);
        for (i, cluster) in plan.clusters.iter().enumerate() {
            assert_eq!(cluster.cluster_id, format!("4x6_{i}"));
            assert_eq!(cluster.seg_index, i as u32);
        }
    }

    #[test]
    fn footprints_are_connected_and_sized() {
        let catalogs = world_content::catalogs();
        let plan = plan_sites(77, 0, 0, dims(), ClusterCaps::default(), &catalogs);
        for cluster in &plan.clusters {
            let expect = catalogs.settlement_spec(cluster.tier).footprint as usize;
            assert!(!cluster.cells.is_empty() && cluster.cells.len() <= expect);
            assert_eq!(cluster.cells[0], cluster.center);
        }
    }

    #[test]
    fn cached_plan_is_returned_by_value() {
        let catalogs = world_content::catalogs();
        let mut world = WorldModel::new();
        world.macro_map.insert(
            MacroCell::key(0, 0),
            MacroCell {
                id: MacroCell::key(0, 0),
                mx: 0,
                my: 0,
                l1: dims(),
                caps: ClusterCaps::default(),
                biome: crate::catalog::Biome::Coast,
                site_plan: None,
            },
        );
        let first = ensure_site_plan(&mut world, 11, 0, 0, &catalogs);
        let mut tampered = ensure_site_plan(&mut world, 11, 0, 0, &catalogs);
        tampered.clusters.clear();
        let second = ensure_site_plan(&mut world, 11, 0, 0, &catalogs);
        assert_eq!(first, second);
    }
}
