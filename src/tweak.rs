//! Live tweak panel for the scene lights.
//!
//! The panel is a tree of folders holding sliders. A slider does not store a
//! value of its own: it is bound to one light field and reads and writes the
//! [`LightingRig`] directly, so edits show up on the next frame.

use anyhow::anyhow;

use crate::{config::Preset, lighting::LightingRig};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    fn of<'a>(self, v: &'a mut cgmath::Vector3<f32>) -> &'a mut f32 {
        match self {
            Axis::X => &mut v.x,
            Axis::Y => &mut v.y,
            Axis::Z => &mut v.z,
        }
    }
}

/// The light field a slider edits.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Binding {
    AmbientIntensity,
    MoonIntensity,
    MoonPosition(Axis),
    DoorIntensity,
    DoorPosition(Axis),
}

impl Binding {
    fn field<'a>(&self, rig: &'a mut LightingRig) -> &'a mut f32 {
        match self {
            Binding::AmbientIntensity => &mut rig.ambient.intensity,
            Binding::MoonIntensity => &mut rig.moon.intensity,
            Binding::MoonPosition(axis) => axis.of(&mut rig.moon.position),
            Binding::DoorIntensity => &mut rig.door.intensity,
            Binding::DoorPosition(axis) => axis.of(&mut rig.door.position),
        }
    }

    pub fn read(&self, rig: &LightingRig) -> f32 {
        match self {
            Binding::AmbientIntensity => rig.ambient.intensity,
            Binding::MoonIntensity => rig.moon.intensity,
            Binding::MoonPosition(Axis::X) => rig.moon.position.x,
            Binding::MoonPosition(Axis::Y) => rig.moon.position.y,
            Binding::MoonPosition(Axis::Z) => rig.moon.position.z,
            Binding::DoorIntensity => rig.door.intensity,
            Binding::DoorPosition(Axis::X) => rig.door.position.x,
            Binding::DoorPosition(Axis::Y) => rig.door.position.y,
            Binding::DoorPosition(Axis::Z) => rig.door.position.z,
        }
    }

    pub fn write(&self, rig: &mut LightingRig, value: f32) {
        *self.field(rig) = value;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Slider {
    pub label: String,
    pub binding: Binding,
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Slider {
    fn new(binding: Binding) -> Self {
        Self {
            label: format!("{binding:?}"),
            binding,
            min: f32::MIN,
            max: f32::MAX,
            step: 0.0,
        }
    }

    pub fn min(&mut self, min: f32) -> &mut Self {
        self.min = min;
        self
    }

    pub fn max(&mut self, max: f32) -> &mut Self {
        self.max = max;
        self
    }

    pub fn step(&mut self, step: f32) -> &mut Self {
        self.step = step;
        self
    }

    pub fn name(&mut self, label: &str) -> &mut Self {
        self.label = label.to_string();
        self
    }

    pub fn value(&self, rig: &LightingRig) -> f32 {
        self.binding.read(rig)
    }

    /// Clamps `value` into range and writes it to the bound light field.
    pub fn set(&self, rig: &mut LightingRig, value: f32) -> f32 {
        let value = value.clamp(self.min, self.max);
        self.binding.write(rig, value);
        value
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Folder {
    pub name: String,
    pub folders: Vec<Folder>,
    pub sliders: Vec<Slider>,
}

impl Folder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    pub fn add_folder(&mut self, name: &str) -> &mut Folder {
        self.folders.push(Folder::new(name));
        let last = self.folders.len() - 1;
        &mut self.folders[last]
    }

    pub fn add(&mut self, binding: Binding) -> &mut Slider {
        self.sliders.push(Slider::new(binding));
        let last = self.sliders.len() - 1;
        &mut self.sliders[last]
    }

    /// All sliders of this folder and its subfolders, depth-first.
    pub fn all_sliders(&self) -> Vec<&Slider> {
        let mut sliders: Vec<&Slider> = self.sliders.iter().collect();
        for folder in &self.folders {
            sliders.extend(folder.all_sliders());
        }
        sliders
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TweakPanel {
    pub root: Folder,
}

impl TweakPanel {
    pub fn new(preset: Preset) -> Self {
        let mut root = Folder::new("Tweaks");
        let lights = root.add_folder("Lights");

        let ambient = lights.add_folder("Ambient Light");
        ambient
            .add(Binding::AmbientIntensity)
            .min(0.0)
            .max(1.0)
            .step(0.001)
            .name("Ambient Light Intensity");

        let directional = lights.add_folder("Directional Light");
        directional
            .add(Binding::MoonIntensity)
            .min(0.0)
            .max(1.0)
            .step(0.001)
            .name("Directional Light Intensity");
        for (axis, label) in [
            (Axis::X, "Directional Light X"),
            (Axis::Y, "Directional Light Y"),
            (Axis::Z, "Directional Light Z"),
        ] {
            directional
                .add(Binding::MoonPosition(axis))
                .min(-5.0)
                .max(5.0)
                .step(0.001)
                .name(label);
        }

        let range = preset.door_light_range();
        let point = lights.add_folder("Point Light");
        point
            .add(Binding::DoorIntensity)
            .min(-range)
            .max(range)
            .step(0.001)
            .name("Point Light Intensity");
        for (axis, label) in [
            (Axis::X, "Point Light X"),
            (Axis::Y, "Point Light Y"),
            (Axis::Z, "Point Light Z"),
        ] {
            point
                .add(Binding::DoorPosition(axis))
                .min(-5.0)
                .max(5.0)
                .step(0.001)
                .name(label);
        }

        Self { root }
    }

    pub fn slider(&self, label: &str) -> Option<&Slider> {
        self.root
            .all_sliders()
            .into_iter()
            .find(|slider| slider.label == label)
    }

    /// Sets the slider called `label`; returns the value actually written.
    pub fn set(&self, label: &str, rig: &mut LightingRig, value: f32) -> anyhow::Result<f32> {
        let slider = self
            .slider(label)
            .ok_or_else(|| anyhow!("no slider called {label:?}"))?;
        Ok(slider.set(rig, value))
    }

    /// Draws the panel. Returns whether any value changed.
    #[cfg(feature = "ui")]
    pub fn show(&self, ctx: &egui::Context, rig: &mut LightingRig) -> bool {
        let mut changed = false;
        egui::Window::new("Tweaks")
            .default_width(280.0)
            .show(ctx, |ui| {
                for folder in &self.root.folders {
                    changed |= show_folder(ui, folder, rig);
                }
            });
        changed
    }
}

#[cfg(feature = "ui")]
fn show_folder(ui: &mut egui::Ui, folder: &Folder, rig: &mut LightingRig) -> bool {
    let mut changed = false;
    egui::CollapsingHeader::new(folder.name.as_str())
        .default_open(true)
        .show(ui, |ui| {
            for slider in &folder.sliders {
                let mut value = slider.value(rig);
                let response = ui.add(
                    egui::Slider::new(&mut value, slider.min..=slider.max)
                        .step_by(slider.step as f64)
                        .text(slider.label.as_str()),
                );
                if response.changed() {
                    slider.set(rig, value);
                    changed = true;
                }
            }
            for sub in &folder.folders {
                changed |= show_folder(ui, sub, rig);
            }
        });
    changed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hierarchy_matches_the_lights() {
        let panel = TweakPanel::new(Preset::Haunted);
        let lights = &panel.root.folders[0];
        assert_eq!(lights.name, "Lights");
        let names: Vec<_> = lights.folders.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["Ambient Light", "Directional Light", "Point Light"]);
        assert_eq!(panel.root.all_sliders().len(), 9);
        assert!(panel.root.all_sliders().iter().all(|s| s.step == 0.001));
    }

    #[test]
    fn door_range_follows_preset() {
        let classic = TweakPanel::new(Preset::Classic);
        let haunted = TweakPanel::new(Preset::Haunted);
        let c = classic.slider("Point Light Intensity").expect("slider");
        let h = haunted.slider("Point Light Intensity").expect("slider");
        assert_eq!((c.min, c.max), (-3.0, 3.0));
        assert_eq!((h.min, h.max), (-2.0, 2.0));
    }

    #[test]
    fn position_slider_moves_one_axis() {
        let panel = TweakPanel::new(Preset::Classic);
        let mut rig = LightingRig::new(Preset::Classic);
        panel.set("Point Light Y", &mut rig, 4.0).expect("known slider");
        assert_eq!(rig.door.position, cgmath::Vector3::new(0.0, 4.0, 2.7));
    }

    #[test]
    fn position_bindings_write_through_to_the_rig() {
        let mut rig = LightingRig::new(Preset::Haunted);
        for (i, axis) in [Axis::X, Axis::Y, Axis::Z].into_iter().enumerate() {
            let value = i as f32 + 0.5;
            Binding::MoonPosition(axis).write(&mut rig, value);
            Binding::DoorPosition(axis).write(&mut rig, -value);
            assert_eq!(Binding::MoonPosition(axis).read(&rig), value);
            assert_eq!(Binding::DoorPosition(axis).read(&rig), -value);
        }
        assert_eq!(rig.moon.position, cgmath::Vector3::new(0.5, 1.5, 2.5));
        assert_eq!(rig.door.position, cgmath::Vector3::new(-0.5, -1.5, -2.5));
    }

    #[test]
    fn unknown_label_is_an_error() {
        let panel = TweakPanel::new(Preset::Classic);
        let mut rig = LightingRig::new(Preset::Classic);
        assert!(panel.set("Ghost Speed", &mut rig, 1.0).is_err());
    }
}
