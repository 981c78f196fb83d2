use std::time::Duration;

use worldsync_shared::protocol::{ObjectCategory, ObjectData, ObjectId};

use crate::{
    notify::{EffectEvent, SoundCue},
    object::{check_scalar, payload_mismatch, GameObject, ObjectBase, SyncContext},
    timer::{TimerHandle, TimerKind},
};

/// How long an emote bubble stays above a player.
pub const EMOTE_DURATION: Duration = Duration::from_secs(4);

const PLAYER_RADIUS: f32 = 2.25;

#[derive(Debug)]
pub struct Player {
    base: ObjectBase,
    hp: f32,
    invulnerable: bool,
    team_id: Option<u8>,
    active_item: Option<String>,
    skin: Option<String>,
    emote: Option<(String, TimerHandle)>,
}

impl Player {
    pub fn new(id: ObjectId) -> Self {
        Self {
            base: ObjectBase::new(id, ObjectCategory::Player),
            hp: 100.0,
            invulnerable: false,
            team_id: None,
            active_item: None,
            skin: None,
            emote: None,
        }
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn invulnerable(&self) -> bool {
        self.invulnerable
    }

    pub fn team_id(&self) -> Option<u8> {
        self.team_id
    }

    pub fn active_item(&self) -> Option<&str> {
        self.active_item.as_deref()
    }

    pub fn skin(&self) -> Option<&str> {
        self.skin.as_deref()
    }

    /// Emote currently shown above the player.
    pub fn emote(&self) -> Option<&str> {
        self.emote.as_ref().map(|(name, _)| name.as_str())
    }

    /// Shows an emote bubble at the player's current authoritative position
    /// and schedules it to hide. Replaces any emote already showing.
    pub fn show_emote(&mut self, emote: &str, ctx: &mut SyncContext<'_>) {
        if let Some((_, handle)) = self.emote.take() {
            handle.kill();
        }
        let handle = self.base.schedule(TimerKind::HideEmote, EMOTE_DURATION, ctx);
        ctx.notify.emit(EffectEvent::Emote {
            player: self.base.id,
            emote: emote.to_string(),
            position: self.base.position(),
        });
        self.emote = Some((emote.to_string(), handle));
    }
}

impl GameObject for Player {
    fn base(&self) -> &ObjectBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut ObjectBase {
        &mut self.base
    }

    fn update_from_data(&mut self, data: &ObjectData, is_new: bool, ctx: &mut SyncContext<'_>) -> anyhow::Result<()> {
        let ObjectData::Player(data) = data else {
            return Err(payload_mismatch(&self.base, data));
        };
        let hp = data.hp.map(|hp| check_scalar("hp", hp)).transpose()?;
        self.base.apply_transform(data.position, data.rotation, is_new, ctx)?;

        if let Some(layer) = data.layer {
            self.base.set_layer(layer, is_new, ctx);
        }
        if let Some(hp) = hp {
            self.hp = hp;
        }
        if let Some(invulnerable) = data.invulnerable {
            self.invulnerable = invulnerable;
        }
        if let Some(team_id) = data.team_id {
            self.team_id = Some(team_id);
        }
        if let Some(item) = &data.active_item {
            if !is_new && self.active_item.as_deref() != Some(item.as_str()) {
                ctx.notify
                    .emit(SoundCue::at(format!("{item}_switch"), self.base.position(), self.base.layer));
            }
            self.active_item = Some(item.clone());
        }
        if let Some(skin) = &data.skin {
            self.skin = Some(skin.clone());
        }
        if data.dead == Some(true) && self.base.kill() {
            if let Some((_, handle)) = self.emote.take() {
                handle.kill();
            }
            if !is_new {
                ctx.notify
                    .emit(SoundCue::at("player_death", self.base.position(), self.base.layer));
            }
        }
        Ok(())
    }

    fn update_debug_graphics(&self, scene: &mut dyn worldsync_shared::render::Scene) {
        scene.draw_debug_circle(self.base.render_position(), PLAYER_RADIUS);
    }

    fn on_timer(&mut self, kind: TimerKind, ctx: &mut SyncContext<'_>) {
        if self.base.destroyed || kind != TimerKind::HideEmote {
            return;
        }
        if self.emote.take().is_some() {
            ctx.notify.emit(EffectEvent::EmoteHidden { player: self.base.id });
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use worldsync_shared::{math::Vec2, protocol::PlayerData};

    use super::*;
    use crate::objects::testing::Harness;

    fn data(f: impl FnOnce(&mut PlayerData)) -> ObjectData {
        let mut d = PlayerData::default();
        f(&mut d);
        ObjectData::Player(d)
    }

    #[test]
    fn partial_update_leaves_absent_fields() {
        let mut h = Harness::default();
        let now = Instant::now();
        let mut p = Player::new(ObjectId(1));
        p.update_from_data(
            &data(|d| {
                d.position = Some(Vec2::new(3.0, 4.0));
                d.hp = Some(100.0);
                d.active_item = Some("ak47".into());
            }),
            true,
            &mut h.ctx(now),
        )
        .unwrap();
        p.update_from_data(&data(|d| d.hp = Some(80.0)), false, &mut h.ctx(now))
            .unwrap();

        assert_eq!(p.hp(), 80.0);
        assert_eq!(p.base().position(), Vec2::new(3.0, 4.0));
        assert_eq!(p.active_item(), Some("ak47"));
        assert!(h.notify.pending::<SoundCue>().is_empty());
    }

    #[test]
    fn death_is_not_reversible() {
        let mut h = Harness::default();
        let now = Instant::now();
        let mut p = Player::new(ObjectId(1));
        p.update_from_data(&data(|d| d.dead = Some(false)), true, &mut h.ctx(now))
            .unwrap();
        p.update_from_data(&data(|d| d.dead = Some(true)), false, &mut h.ctx(now))
            .unwrap();
        p.update_from_data(&data(|d| d.dead = Some(false)), false, &mut h.ctx(now))
            .unwrap();
        assert!(p.base().dead);
        assert_eq!(h.notify.pending::<SoundCue>().len(), 1);
    }

    #[test]
    fn invalid_hp_is_rejected_without_mutation() {
        let mut h = Harness::default();
        let now = Instant::now();
        let mut p = Player::new(ObjectId(1));
        let err = p
            .update_from_data(
                &data(|d| {
                    d.hp = Some(f32::NAN);
                    d.position = Some(Vec2::new(1.0, 1.0));
                }),
                false,
                &mut h.ctx(now),
            )
            .unwrap_err();
        assert!(err.to_string().contains("hp"));
        assert_eq!(p.hp(), 100.0);
        assert_eq!(p.base().position(), Vec2::ZERO);
    }

    #[test]
    fn emote_hides_after_timer() {
        let mut h = Harness::default();
        let now = Instant::now();
        let mut p = Player::new(ObjectId(4));
        p.update_from_data(&data(|d| d.position = Some(Vec2::new(1.0, 2.0))), true, &mut h.ctx(now))
            .unwrap();
        p.show_emote("wave", &mut h.ctx(now));
        assert_eq!(p.emote(), Some("wave"));
        assert_eq!(
            h.notify.drain::<EffectEvent>(),
            vec![EffectEvent::Emote {
                player: ObjectId(4),
                emote: "wave".into(),
                position: Vec2::new(1.0, 2.0),
            }]
        );

        let fired = h.timers.due(now + EMOTE_DURATION);
        assert_eq!(fired.len(), 1);
        p.on_timer(fired[0].kind, &mut h.ctx(now + EMOTE_DURATION));
        assert_eq!(p.emote(), None);
        assert_eq!(
            h.notify.drain::<EffectEvent>(),
            vec![EffectEvent::EmoteHidden { player: ObjectId(4) }]
        );
    }

    #[test]
    fn second_emote_cancels_first_timer() {
        let mut h = Harness::default();
        let now = Instant::now();
        let mut p = Player::new(ObjectId(4));
        p.show_emote("wave", &mut h.ctx(now));
        p.show_emote("thumbs_up", &mut h.ctx(now + Duration::from_secs(1)));
        assert_eq!(h.timers.len(), 1);
        assert!(h.timers.due(now + EMOTE_DURATION).is_empty());
        assert_eq!(p.emote(), Some("thumbs_up"));
    }
}
