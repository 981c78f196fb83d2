use std::time::Duration;

use worldsync_shared::protocol::{ObjectCategory, ObjectData, ObjectId};

use crate::{
    notify::EffectEvent,
    object::{payload_mismatch, GameObject, ObjectBase, SyncContext},
    timer::TimerKind,
};

/// Length of the drop-in animation of a fresh marker.
pub const MARKER_SETTLE_DELAY: Duration = Duration::from_millis(300);

/// Grave marker left where a player died.
#[derive(Debug)]
pub struct DeathMarker {
    base: ObjectBase,
    player_id: Option<ObjectId>,
    label: String,
    settled: bool,
}

impl DeathMarker {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::DeathMarker),
            player_id: None,
            label: String::new(),
            settled: true,
        }
    }

    pub fn player_id(&self) -> Option<ObjectId> {
        self.player_id
    }

    /// Name of the fallen player.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// False while the drop-in animation runs.
    pub fn settled(&self) -> bool {
        self.settled
    }
}

impl GameObject for DeathMarker {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::DeathMarker(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        self.base.apply_transform(data.position, None, is_new, ctx)?;
        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        if let Some(player) = data.player_id {
            self.player_id = Some(player);
            self.label = ctx.names.name(player).unwrap_or("Unknown").to_string();
        }
        if is_new && data.fresh == Some(true) {
            self.settled = false;
            ctx.notify.emit(EffectEvent::MarkerDrop {
                marker: self.base.id,
                position: self.base.position(),
            });
            self.base.schedule(TimerKind::SettleMarker, MARKER_SETTLE_DELAY, ctx);
        }
        Ok(())
    }

    fn on_timer(&mut self, kind: TimerKind, ctx: &mut SyncContext<'_>) {
        if self.base.destroyed || kind != TimerKind::SettleMarker {
            return;
        }
        self.settled = true;
        ctx.notify.emit(EffectEvent::MarkerSettled { marker: self.base.id });
    }
}
