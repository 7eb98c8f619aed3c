#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns projectile and melee overlaps into damage commands.

use bastion_core::{
    Command, Damage, DamageApplication, Health, HostileId, HostileSnapshot, HostileView,
    MeleeView, ProjectileSnapshot, ProjectileView,
};

/// Damage dealt to a hostile caught in a splash at `distance` from the impact.
///
/// Falls off linearly from full damage at the impact point to zero at the
/// splash radius, rounding down. Hostiles at exactly the radius are still
/// caught with zero damage; hostiles beyond it, or any hostile when the radius
/// is not positive, are not caught at all.
#[must_use]
pub fn splash_damage(damage: Damage, distance: f32, radius: f32) -> Option<Damage> {
    if !(radius > 0.0) || distance > radius {
        return None;
    }

    let scale = (1.0 - distance / radius).clamp(0.0, 1.0);
    let amount = (damage.get() as f32 * scale).floor();
    Some(Damage::new(amount as u32))
}

/// Resolves a projectile impact on `primary` into per-hostile applications.
///
/// The primary hostile receives the full projectile damage. With a splash
/// radius every other hostile of `hostiles` within the radius of the primary's
/// position receives [`splash_damage`]. The status effect, if any, rides along
/// with every application.
#[must_use]
pub fn resolve_hit(
    projectile: &ProjectileSnapshot,
    primary: &HostileSnapshot,
    hostiles: &HostileView,
) -> Vec<DamageApplication> {
    let mut applications = vec![DamageApplication {
        hostile: primary.id,
        amount: projectile.damage,
        effect: projectile.effect,
    }];

    let Some(radius) = projectile.splash_radius else {
        return applications;
    };

    for other in hostiles.iter() {
        if other.id == primary.id {
            continue;
        }
        let distance = other.position.distance(primary.position);
        if let Some(amount) = splash_damage(projectile.damage, distance, radius) {
            applications.push(DamageApplication {
                hostile: other.id,
                amount,
                effect: projectile.effect,
            });
        }
    }
    applications
}

/// Combat resolution system that tracks health within a tick so hostiles
/// killed by an earlier impact are not struck again.
#[derive(Debug, Default)]
pub struct CombatResolution {
    health: Vec<(HostileId, Health)>,
}

impl CombatResolution {
    /// Creates a new combat resolution system with empty scratch buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Emits [`Command::ApplyHit`] for every projectile overlapping a hostile
    /// and [`Command::ApplyMeleeHit`] for every fresh melee overlap.
    ///
    /// Projectiles are resolved in identifier order and strike the overlapping
    /// hostile with the lowest identifier. Each projectile is consumed by its
    /// first impact.
    pub fn handle(
        &mut self,
        projectiles: &ProjectileView,
        hostiles: &HostileView,
        melee: &MeleeView,
        out: &mut Vec<Command>,
    ) {
        if hostiles.is_empty() {
            return;
        }

        self.health.clear();
        self.health
            .extend(hostiles.iter().map(|hostile| (hostile.id, hostile.health)));

        for projectile in projectiles.iter() {
            let body = projectile.body();
            let primary = hostiles
                .iter()
                .find(|hostile| self.is_alive(hostile.id) && hostile.body().overlaps(&body));
            let Some(primary) = primary else {
                continue;
            };

            let applications: Vec<DamageApplication> = resolve_hit(projectile, primary, hostiles)
                .into_iter()
                .filter(|application| self.is_alive(application.hostile))
                .collect();
            for application in &applications {
                self.subtract(application.hostile, application.amount);
            }
            out.push(Command::ApplyHit {
                projectile: projectile.id,
                applications,
            });
        }

        for activation in melee.iter() {
            for hostile in hostiles.iter() {
                if activation.has_hit(hostile.id) || !self.is_alive(hostile.id) {
                    continue;
                }
                if !hostile.body().overlaps(&activation.hitbox) {
                    continue;
                }
                self.subtract(hostile.id, activation.damage);
                out.push(Command::ApplyMeleeHit {
                    activation: activation.id,
                    hostile: hostile.id,
                });
            }
        }
    }

    fn is_alive(&self, hostile: HostileId) -> bool {
        self.slot(hostile)
            .map_or(false, |index| !self.health[index].1.is_zero())
    }

    fn subtract(&mut self, hostile: HostileId, amount: Damage) {
        if let Some(index) = self.slot(hostile) {
            let entry = &mut self.health[index];
            entry.1 = entry.1.saturating_sub(amount);
        }
    }

    fn slot(&self, hostile: HostileId) -> Option<usize> {
        self.health
            .binary_search_by_key(&hostile, |(id, _)| *id)
            .ok()
    }
}
