//! Spawns enemies and tracks their health.

use loocast_runtime::identifier::InstanceIdentifier;
use loocast_runtime::instance::InstanceHandle;
use loocast_runtime::registry::Shared;
use loocast_runtime::{Context, Identity, Manager, NativeType, Result, TypeIdentifier};

/// A spawned enemy.
pub struct EnemyUnit;

/// Health points of enemy instances.
pub type HealthPoints = Shared<InstanceIdentifier, u32>;

const SPAWNS: [u32; 3] = [100, 80, 120];

/// The enemy module manager.
#[derive(Default)]
pub struct Enemy {
    health:  Option<HealthPoints>,
    spawned: Vec<InstanceHandle>,
}

impl Manager for Enemy {
    fn name(&self) -> &str { "Enemy" }

    fn owned_types(&self) -> Vec<NativeType> { vec![NativeType::of::<EnemyUnit>()] }

    fn pre_initialize(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        self.health = Some(cx.registries_mut().create_registry()?);
        Ok(())
    }

    fn initialize(&mut self, cx: &mut Context, me: &Identity) -> Result<()> {
        let health = cx.registries().get_registry::<InstanceIdentifier, u32>()?;
        let unit = TypeIdentifier::parse("LooCast.Enemy:EnemyUnit")?;

        let (_, _, types, instances) = cx.split_mut();
        let ty = types.get(&unit)?;
        for points in SPAWNS {
            let handle = instances.create(ty, Some(me.instance))?;
            let id = instances.instance(handle).map(|instance| instance.id().clone());
            if let Some(id) = id {
                log::debug!("Spawned {id} with {points} HP");
                health.write().register(id, points)?;
            }
            self.spawned.push(handle);
        }
        Ok(())
    }

    fn terminate(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        let Some(health) = &self.health else { return Ok(()) };
        for handle in self.spawned.drain(..) {
            for id in cx.instances_mut().destroy(handle)? {
                health.write().unregister(&id)?;
            }
        }
        Ok(())
    }
}

/// Applies module-local health overrides on top of the enemy health registry.
#[derive(Default)]
pub struct Health {
    overrides: Option<HealthPoints>,
}

impl Manager for Health {
    fn name(&self) -> &str { "Health" }

    fn pre_initialize(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        self.overrides = Some(cx.registries().scoped::<InstanceIdentifier, u32>()?);
        Ok(())
    }

    fn post_initialize(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        let Some(overrides) = &self.overrides else { return Ok(()) };
        let base = cx.registries().get_registry::<InstanceIdentifier, u32>()?;
        let Some(boss) = base.read().keys().next().cloned() else { return Ok(()) };

        overrides.write().register(boss.clone(), 500)?;
        let overridden = overrides.read().get(&boss)?;
        let base_points = base.read().get(&boss)?;
        log::info!(
            "{boss} has {overridden} HP in the health scope and {base_points} HP in its base"
        );
        Ok(())
    }
}
