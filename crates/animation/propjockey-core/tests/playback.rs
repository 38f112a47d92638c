use std::cell::RefCell;
use std::rc::Rc;

use propjockey_core::{
    setters, slide, Animation, AnimationDefinition, AnimationError, CallbackError, Keyframe,
    ObjectRef, PlaySettings, PropertyBag, PropertyConfig, Setter, TimingPool, Value,
};

fn text(s: &str) -> Option<Value> {
    Some(Value::Text(s.to_string()))
}

fn hello_world(pool: &TimingPool) -> Animation {
    let def = AnimationDefinition::builder(pool.clone())
        .name("hello-world")
        .prop(
            "opacity",
            PropertyConfig::new(vec![Keyframe::new(0.0, 50.0), Keyframe::new(2000.0, 100.0)]),
        )
        .prop(
            "width",
            PropertyConfig::new(vec![
                Keyframe::new(0.0, 100.0),
                Keyframe::new(1000.0, 50.0),
                Keyframe::new(2000.0, 200.0),
            ])
            .with_unit("verypx")
            .with_setter(setters::prop_unit()),
        )
        .prop(
            "color",
            PropertyConfig::new(vec![
                Keyframe::new(0.0, "#ff00ff"),
                Keyframe::new(2000.0, "#00ffff"),
                Keyframe::new(2500.0, "#ffffff"),
            ])
            .with_slide(slide::color()),
        )
        .build()
        .unwrap();
    Animation::new(def)
}

/// it should play, pause, speed up and finish a three-property animation
#[test]
fn hello_world_plays_to_completion() {
    let pool = TimingPool::manual();
    let anim = hello_world(&pool);
    let obj = ObjectRef::new(PropertyBag::new());

    anim.play(&obj, None).unwrap();
    assert!(pool.is_running());

    pool.tick(0.0).unwrap();
    assert_eq!(obj.number("opacity"), Some(50.0));
    assert_eq!(obj.get("width"), text("100verypx"));
    assert_eq!(obj.get("color"), text("#ff00ff"));

    pool.tick(500.0).unwrap();
    assert_eq!(obj.number("opacity"), Some(62.5));
    assert_eq!(obj.get("width"), text("75verypx"));
    assert_eq!(obj.get("color"), text("#bf40ff"));

    // paused frames render in place
    anim.set_speed(&obj, 2.0).pause(&obj);
    pool.tick(500.0).unwrap();
    assert_eq!(anim.position(&obj), Some(500.0));
    assert_eq!(obj.number("opacity"), Some(62.5));

    anim.resume(None::<&ObjectRef>);
    assert_eq!(anim.speed(&obj), Some(0.0));
    anim.resume(&obj);
    assert_eq!(anim.speed(&obj), Some(2.0));

    pool.tick(250.0).unwrap();
    assert_eq!(anim.position(&obj), Some(1000.0));
    assert_eq!(obj.number("opacity"), Some(75.0));
    assert_eq!(obj.get("width"), text("50verypx"));
    assert_eq!(obj.get("color"), text("#8080ff"));

    anim.set_speed(&obj, 0.0);
    assert_eq!(anim.animation_state(&obj).unwrap().resume_speed, 2.0);
    anim.set_speed(&obj, 1.0);
    assert_eq!(anim.animation_state(&obj).unwrap().resume_speed, 1.0);

    pool.tick(500.0).unwrap();
    assert_eq!(obj.number("opacity"), Some(87.5));
    assert_eq!(obj.get("width"), text("125verypx"));
    assert_eq!(obj.get("color"), text("#40bfff"));

    pool.tick(500.0).unwrap();
    assert_eq!(obj.number("opacity"), Some(100.0));
    assert_eq!(obj.get("width"), text("200verypx"));
    assert_eq!(obj.get("color"), text("#00ffff"));
    assert!(pool.contains(&obj));
    assert!(pool.is_running());

    pool.tick(250.0).unwrap();
    assert_eq!(obj.get("color"), text("#80ffff"));
    assert_eq!(obj.number("opacity"), Some(100.0));
    assert_eq!(obj.get("width"), text("200verypx"));

    pool.tick(250.0).unwrap();
    assert_eq!(obj.get("color"), text("#ffffff"));
    assert!(!pool.contains(&obj));
    assert_eq!(pool.object_count(), 0);
    assert!(!pool.is_running());
}

/// it should hold writes until maxFPS allows a frame, then apply the whole elapsed time
#[test]
fn max_fps_batches_small_deltas() {
    let pool = TimingPool::manual();
    let writes = Rc::new(RefCell::new(0));
    let count = writes.clone();
    let def = AnimationDefinition::builder(pool.clone())
        .max_fps(30.0)
        .prop(
            "x",
            PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1000.0, 1000.0)]),
        )
        .default_setter(Setter::new(move |target, name, value, _| {
            *count.borrow_mut() += 1;
            target.set_property(name, value)
        }))
        .build()
        .unwrap();
    let anim = Animation::new(def);
    let obj = ObjectRef::new(PropertyBag::new());
    anim.play(&obj, None).unwrap();

    pool.tick(10.0).unwrap();
    pool.tick(10.0).unwrap();
    assert_eq!(*writes.borrow(), 0);
    assert_eq!(anim.position(&obj), Some(0.0));

    pool.tick(20.0).unwrap();
    assert_eq!(*writes.borrow(), 1);
    assert_eq!(anim.position(&obj), Some(40.0));
    assert_eq!(obj.number("x"), Some(40.0));
}

/// it should carry time left over from the initial delay into the first frame
#[test]
fn initial_delay_overshoot_carries_into_the_timeline() {
    let pool = TimingPool::manual();
    let def = AnimationDefinition::builder(pool.clone())
        .initial_delay(100.0)
        .prop(
            "x",
            PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1000.0, 1.0)]),
        )
        .build()
        .unwrap();
    let anim = Animation::new(def);
    let obj = ObjectRef::new(PropertyBag::new());
    anim.play(&obj, None).unwrap();

    pool.tick(60.0).unwrap();
    assert_eq!(obj.get("x"), None);
    assert_eq!(anim.delay(&obj), Some(40.0));

    pool.tick(60.0).unwrap();
    assert_eq!(anim.delay(&obj), Some(0.0));
    assert_eq!(anim.position(&obj), Some(20.0));
}

/// it should ebb back to the start and then repeat after the repeat delay
#[test]
fn ebb_then_repeat_with_repeat_delay() {
    let pool = TimingPool::manual();
    let def = AnimationDefinition::builder(pool.clone())
        .ebb(true)
        .repeat(true)
        .repeat_delay(50.0)
        .prop(
            "x",
            PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 10.0)]),
        )
        .build()
        .unwrap();
    let anim = Animation::new(def);
    let obj = ObjectRef::new(PropertyBag::new());
    anim.play(&obj, None).unwrap();

    pool.tick(100.0).unwrap();
    assert_eq!(obj.number("x"), Some(10.0));
    let state = anim.animation_state(&obj).unwrap();
    assert!(state.ebbing);
    assert_eq!(state.current_speed, -1.0);

    pool.tick(110.0).unwrap();
    assert_eq!(obj.number("x"), Some(0.0));
    let state = anim.animation_state(&obj).unwrap();
    assert!(!state.ebbing);
    assert_eq!(state.current_speed, 1.0);
    assert_eq!(state.repeat_count, 1);
    assert_eq!(state.delay_remaining, 50.0);
    assert!(pool.contains(&obj));
}

/// it should visit objects in the order they started playing
#[test]
fn objects_tick_in_insertion_order() {
    let pool = TimingPool::manual();
    let order = Rc::new(RefCell::new(Vec::new()));
    let seen = order.clone();
    let def = AnimationDefinition::builder(pool.clone())
        .prop(
            "x",
            PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 1.0)]),
        )
        .default_setter(Setter::new(move |target, name, value, _| {
            let tag = target.property("tag");
            seen.borrow_mut().push(tag);
            target.set_property(name, value)
        }))
        .build()
        .unwrap();
    let anim = Animation::new(def);
    let objects: Vec<ObjectRef> = ["c", "a", "b"]
        .iter()
        .map(|tag| ObjectRef::new(PropertyBag::new().with("tag", *tag)))
        .collect();
    for obj in &objects {
        anim.play(obj, None).unwrap();
    }
    pool.tick(10.0).unwrap();
    assert_eq!(*order.borrow(), vec![text("c"), text("a"), text("b")]);
}

/// it should skip an instance stopped by a callback earlier in the same frame
#[test]
fn stopping_mid_frame_skips_the_stopped_instance() {
    let pool = TimingPool::manual();
    let victim = ObjectRef::new(PropertyBag::new());
    let handle: Rc<RefCell<Option<Animation>>> = Rc::new(RefCell::new(None));

    let (slot, target) = (handle.clone(), victim.clone());
    let def = AnimationDefinition::builder(pool.clone())
        .prop(
            "x",
            PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 1.0)]),
        )
        .on_after_frame(propjockey_core::FrameCallback::new(move |_, _, _| {
            if let Some(anim) = slot.borrow().as_ref() {
                anim.stop(&target);
            }
            Ok(())
        }))
        .build()
        .unwrap();
    let anim = Animation::new(def);
    *handle.borrow_mut() = Some(anim.clone());

    let first = ObjectRef::new(PropertyBag::new());
    anim.play(&first, None).unwrap();
    anim.play(&victim, None).unwrap();

    pool.tick(10.0).unwrap();
    assert_eq!(first.number("x"), Some(0.1));
    assert_eq!(victim.get("x"), None);
    assert!(!pool.contains(&victim));
    assert!(pool.contains(&first));

    // drop the callback's handle so the definition can be freed
    handle.borrow_mut().take();
}

/// it should surface setter failures from the pool tick
#[test]
fn callback_errors_abort_the_frame() {
    let pool = TimingPool::manual();
    let def = AnimationDefinition::builder(pool.clone())
        .prop(
            "x",
            PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 1.0)]),
        )
        .default_setter(Setter::new(|_, _, _, _| Err(CallbackError::new("read-only"))))
        .build()
        .unwrap();
    let anim = Animation::new(def);
    let obj = ObjectRef::new(PropertyBag::new());
    anim.play(&obj, Some(PlaySettings::default())).unwrap();

    let err = pool.tick(10.0).unwrap_err();
    assert_eq!(err, AnimationError::Callback(CallbackError::new("read-only")));
    assert_eq!(err.category(), "callback");
    // the instance stays registered
    assert!(pool.contains(&obj));
}

/// it should keep the pool running while another animation remains on the object
#[test]
fn two_animations_share_one_object() {
    let pool = TimingPool::manual();
    let build = |prop: &str| {
        Animation::new(
            AnimationDefinition::builder(pool.clone())
                .prop(
                    prop,
                    PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 1.0)]),
                )
                .build()
                .unwrap(),
        )
    };
    let (a, b) = (build("x"), build("y"));
    let obj = ObjectRef::new(PropertyBag::new());
    a.play(&obj, None).unwrap();
    b.play(&obj, None).unwrap();
    assert_eq!(pool.instance_count(&obj), 2);

    a.stop(&obj);
    assert_eq!(pool.instance_count(&obj), 1);
    assert!(pool.is_running());

    pool.tick(50.0).unwrap();
    assert_eq!(obj.get("x"), None);
    assert_eq!(obj.number("y"), Some(0.5));
}

/// it should apply a pause requested by the instance's own frame callback
#[test]
fn pausing_from_the_frame_callback_takes_effect() {
    let pool = TimingPool::manual();
    let obj = ObjectRef::new(PropertyBag::new());
    let handle: Rc<RefCell<Option<Animation>>> = Rc::new(RefCell::new(None));

    let (slot, target) = (handle.clone(), obj.clone());
    let def = AnimationDefinition::builder(pool.clone())
        .prop(
            "x",
            PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 100.0)]),
        )
        .on_after_frame(propjockey_core::FrameCallback::new(move |_, _, state| {
            if state.current_position >= 10.0 {
                if let Some(anim) = slot.borrow().as_ref() {
                    anim.pause(&target);
                }
            }
            Ok(())
        }))
        .build()
        .unwrap();
    let anim = Animation::new(def);
    *handle.borrow_mut() = Some(anim.clone());

    anim.play(&obj, None).unwrap();
    pool.tick(10.0).unwrap();
    assert_eq!(anim.speed(&obj), Some(0.0));
    assert_eq!(anim.animation_state(&obj).unwrap().resume_speed, 1.0);

    pool.tick(10.0).unwrap();
    pool.tick(10.0).unwrap();
    assert_eq!(anim.position(&obj), Some(10.0));
    assert_eq!(obj.number("x"), Some(10.0));
    assert!(anim.animation_state(&obj).unwrap().is_paused());

    anim.resume(&obj);
    assert_eq!(anim.speed(&obj), Some(1.0));
    handle.borrow_mut().take();
}
