//! Animation tree flattening.

use crate::types::{Animation, AnimationMap, AnimationRef, LocationMap, merge_rules};

/// Flattens animations; nested ones are named `parent-child`.
///
/// Animations without frames only namespace their children.
pub fn build_animation_map(
    animations: &[Animation],
    locations: &LocationMap,
    url: Option<&str>,
) -> AnimationMap {
    let mut map = AnimationMap::new();
    for (i, animation) in animations.iter().enumerate() {
        flatten(animation, None, &format!("animations.{i}"), locations, url, &mut map);
    }
    map
}

fn flatten(
    animation: &Animation,
    parent: Option<&str>,
    pointer: &str,
    locations: &LocationMap,
    url: Option<&str>,
    map: &mut AnimationMap,
) {
    let name = match parent {
        Some(parent) => format!("{parent}-{}", animation.name),
        None => animation.name.clone(),
    };

    if !animation.frames.is_empty() {
        match map.get_mut(&name) {
            Some(existing) => {
                for (frame, rules) in &animation.frames {
                    merge_rules(existing.frames.entry(frame.clone()).or_default(), rules);
                }
            }
            None => {
                map.insert(
                    name.clone(),
                    AnimationRef {
                        name: name.clone(),
                        frames: animation.frames.clone(),
                        url: url.map(str::to_string),
                        pointer: pointer.to_string(),
                        location: locations.get(pointer),
                    },
                );
            }
        }
    }

    for (i, child) in animation.children.iter().enumerate() {
        flatten(
            child,
            Some(&name),
            &format!("{pointer}.children.{i}"),
            locations,
            url,
            map,
        );
    }
}
