//! Picks enemies as mission targets.

use loocast_runtime::identifier::InstanceIdentifier;
use loocast_runtime::runtime::{Builder, NodeIndex};
use loocast_runtime::{Context, Identity, Manager, NativeType, Result};

/// The mission feature.
pub struct Bundle;

impl loocast_runtime::Bundle for Bundle {
    fn register(&self, builder: &mut Builder, parent: NodeIndex) {
        let mission = builder.child(parent, Box::new(Mission));
        builder.sub_module(mission, Target::default());
    }
}

/// An objective of a mission.
pub struct Objective;

/// The mission module manager.
pub struct Mission;

impl Manager for Mission {
    fn name(&self) -> &str { "Mission" }

    fn owned_types(&self) -> Vec<NativeType> { vec![NativeType::of::<Objective>()] }

    fn initialize(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        let enemy = cx.namespaces().get("LooCast.Enemy")?;
        let types: Vec<_> =
            cx.types().types_in(enemy.handle()).map(|ty| ty.id().to_string()).collect();
        log::debug!("Missions can target {}", types.join(", "));
        Ok(())
    }
}

/// Tracks the current target.
#[derive(Default)]
pub struct Target {
    current: Option<InstanceIdentifier>,
}

impl Target {
    /// The current target, if any enemy was alive when missions started.
    pub fn current(&self) -> Option<&InstanceIdentifier> { self.current.as_ref() }
}

impl Manager for Target {
    fn name(&self) -> &str { "Target" }

    fn post_initialize(&mut self, cx: &mut Context, _me: &Identity) -> Result<()> {
        let health = cx.registries().get_registry::<InstanceIdentifier, u32>()?;
        let health = health.read();
        self.current = health.iter().max_by_key(|(_, points)| **points).map(|(id, _)| id.clone());
        Ok(())
    }

    fn early_pre_terminate(&mut self, _cx: &mut Context, _me: &Identity) -> Result<()> {
        self.current = None;
        Ok(())
    }
}
