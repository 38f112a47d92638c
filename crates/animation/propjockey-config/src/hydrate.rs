//! Document -> core definition.

use propjockey_core::{
    Animation, AnimationDefinition, Keyframe, KeyframeValue, PropertyConfig, Resolvable,
};

use crate::document::{
    AnimationDocument, Identifier, KeyframeDocument, KeyframeValueDocument, PropertyDocument,
    Setting,
};
use crate::kinds::{EaseKind, SetterKind, SlideKind, TimingKind};
use crate::store::{HydrationStore, DEFAULT_EASE, DEFAULT_SETTER, DEFAULT_SLIDE, DEFAULT_TIMING_POOL};
use crate::Result;

/// Resolve every identifier in `document` through `store` and build the definition.
///
/// Missing globals fall back to `timing.frame-callback`, `ease.linear`, `slide.number` and
/// `setter.object.prop`.
pub fn hydrate(document: &AnimationDocument, store: &HydrationStore) -> Result<AnimationDefinition> {
    let or_default = |id: &Option<Identifier>, fallback: &str| {
        id.clone().unwrap_or_else(|| Identifier::name(fallback))
    };

    let timing = TimingKind::parse(&or_default(&document.timing_pool, DEFAULT_TIMING_POOL))?;
    let pool = store.timing_pool(&timing)?;
    let ease = EaseKind::parse(&or_default(&document.default_ease, DEFAULT_EASE))?;
    let slide = SlideKind::parse(&or_default(&document.default_slide, DEFAULT_SLIDE))?;
    let setter = SetterKind::parse(&or_default(&document.default_setter, DEFAULT_SETTER))?;

    let mut builder = AnimationDefinition::builder(pool)
        .name(document.name.clone())
        .default_ease(store.resolve_ease(&ease)?)
        .default_slide(store.resolve_slide(&slide)?)
        .default_setter(store.resolve_setter(&setter)?);

    if let Some(fps) = document.max_fps {
        builder = builder.max_fps(fps);
    }
    if let Some(delay) = &document.initial_delay {
        builder = builder.initial_delay(delay_setting(delay, store)?);
    }
    if let Some(delay) = &document.repeat_delay {
        builder = builder.repeat_delay(delay_setting(delay, store)?);
    }
    if let Some(repeat) = &document.repeat {
        builder = builder.repeat(predicate_setting(repeat, store)?);
    }
    if let Some(ebb) = &document.ebb {
        builder = builder.ebb(predicate_setting(ebb, store)?);
    }
    if let Some(name) = &document.on_after_frame {
        builder = builder.on_after_frame(store.frame_callback(name)?);
    }

    for (name, prop) in &document.props {
        builder = builder.prop(name.clone(), hydrate_property(prop, store)?);
    }

    let definition = builder.build()?;
    log::debug!(
        "hydrated '{}' on {timing}: {} properties, last keyframe at {}ms",
        definition.name(),
        definition.prop_count(),
        definition.last_keyframe_position()
    );
    Ok(definition)
}

/// Parse JSON text, hydrate it, and wrap the result in a playable handle.
pub fn parse_animation_json(json: &str, store: &HydrationStore) -> Result<Animation> {
    let document = AnimationDocument::from_json(json)?;
    Ok(Animation::new(hydrate(&document, store)?))
}

fn hydrate_property(prop: &PropertyDocument, store: &HydrationStore) -> Result<PropertyConfig> {
    let keyframes = prop
        .keyframes
        .iter()
        .map(|kf| hydrate_keyframe(kf, store))
        .collect::<Result<Vec<_>>>()?;
    let mut config = PropertyConfig::new(keyframes);
    if let Some(slide) = &prop.slide {
        config = config.with_slide(store.resolve_slide(&SlideKind::parse(slide)?)?);
    }
    if let Some(setter) = &prop.setter {
        config = config.with_setter(store.resolve_setter(&SetterKind::parse(setter)?)?);
    }
    if let Some(unit) = &prop.unit {
        config = config.with_unit(unit.clone());
    }
    Ok(config)
}

fn hydrate_keyframe(kf: &KeyframeDocument, store: &HydrationStore) -> Result<Keyframe> {
    let value: KeyframeValue = match &kf.value {
        KeyframeValueDocument::Literal(v) => v.clone().into(),
        KeyframeValueDocument::Source { source } => store.value_source(source)?,
    };
    let mut keyframe = Keyframe::new(kf.position, value);
    if let Some(ease) = &kf.ease {
        keyframe = keyframe.with_ease(store.resolve_ease(&EaseKind::parse(ease)?)?);
    }
    if let Some(callback) = &kf.callback {
        keyframe = keyframe.with_callback(store.keyframe_callback(callback)?);
    }
    Ok(keyframe)
}

fn delay_setting(setting: &Setting<f64>, store: &HydrationStore) -> Result<Resolvable<f64>> {
    match setting {
        Setting::Literal(ms) => Ok(Resolvable::Literal(*ms)),
        Setting::Named(name) => store.delay(name),
    }
}

fn predicate_setting(setting: &Setting<bool>, store: &HydrationStore) -> Result<Resolvable<bool>> {
    match setting {
        Setting::Literal(flag) => Ok(Resolvable::Literal(*flag)),
        Setting::Named(name) => store.predicate(name),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ConfigError;
    use propjockey_core::{AnimationError, ObjectRef, PropertyBag, Value};

    const MINIMAL: &str = r#"{
        "timingPool": "timing.manual",
        "props": { "x": { "keyframes": [
            { "position": 0, "value": 0 },
            { "position": 100, "value": 10 }
        ] } }
    }"#;

    #[test]
    fn defaults_fill_missing_globals() {
        let store = HydrationStore::new();
        let doc = AnimationDocument::from_json(r#"{ "props": {} }"#).unwrap();
        let def = hydrate(&doc, &store).unwrap();
        let pool = store.timing_pool(&TimingKind::FrameCallback).unwrap();
        assert!(def.timing_pool().ptr_eq(&pool));
        assert_eq!(def.max_fps(), None);
        assert_eq!(def.last_keyframe_position(), 0.0);
    }

    #[test]
    fn plays_from_json() {
        let store = HydrationStore::new();
        let anim = parse_animation_json(MINIMAL, &store).unwrap();
        let obj = ObjectRef::new(PropertyBag::new());
        anim.play(&obj, None).unwrap();
        anim.timing_pool().tick(50.0).unwrap();
        assert_eq!(obj.get("x"), Some(Value::Number(5.0)));
    }

    #[test]
    fn named_settings_resolve_through_the_store() {
        let mut store = HydrationStore::new();
        store
            .register_delay("delay.fixed", |_, _| Ok(30.0))
            .register_predicate("repeat.twice", |state, _| Ok(state.repeat_count < 2))
            .register_value_source("value.start", |target, name, _, _| {
                Ok(target.property(name).unwrap_or(Value::Number(-1.0)))
            });
        let json = r#"{
            "timingPool": "timing.manual",
            "initialDelay": "delay.fixed",
            "repeat": "repeat.twice",
            "props": { "x": { "keyframes": [
                { "position": 0, "value": { "source": "value.start" } },
                { "position": 100, "value": 100 }
            ] } }
        }"#;
        let anim = parse_animation_json(json, &store).unwrap();
        let obj = ObjectRef::new(PropertyBag::new().with("x", 20.0));
        anim.play(&obj, None).unwrap();
        assert_eq!(anim.delay(&obj), Some(30.0));

        anim.timing_pool().tick(80.0).unwrap();
        assert_eq!(anim.position(&obj), Some(50.0));
        assert_eq!(obj.get("x"), Some(Value::Number(60.0)));
    }

    #[test]
    fn unknown_identifiers_fail_hydration() {
        let store = HydrationStore::new();
        let json = MINIMAL.replace("\"timing.manual\"", "\"timing.vsync\"");
        let err = parse_animation_json(&json, &store).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::UnknownIdentifier { kind: "timing pool", .. }
        ));

        let json = r#"{ "timingPool": "timing.manual", "onAfterFrame": "log.frame", "props": {} }"#;
        let err = parse_animation_json(json, &store).unwrap_err();
        assert_eq!(err.to_string(), "Unknown frame callback identifier 'log.frame'");
    }

    #[test]
    fn core_validation_errors_pass_through() {
        let store = HydrationStore::new();
        let json = r#"{
            "timingPool": "timing.manual",
            "props": { "x": { "keyframes": [
                { "position": 100, "value": 0 },
                { "position": 50, "value": 1 }
            ] } }
        }"#;
        let err = parse_animation_json(json, &store).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Definition(AnimationError::InvalidKeyframes { .. })
        ));
        assert_eq!(err.category(), "validation");
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let store = HydrationStore::new();
        let err = parse_animation_json("{ nope", &store).unwrap_err();
        assert_eq!(err.category(), "parse");
    }
}
