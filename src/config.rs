use std::collections::HashMap;
use std::path::{Path, PathBuf};

use glam::Vec3;
use tinyjson::JsonValue;

use crate::error::Error;

/// Startup settings, read from an optional JSON file. Every key is optional.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    /// Base directory for every relative path below. Defaults to the
    /// directory the executable lives in, which must then contain `res/`
    /// and the asset directory. `res/viewer.json` sets it to the working
    /// directory so `cargo run -- res/viewer.json` works from the crate root.
    pub resource_dir: Option<PathBuf>,
    pub asset_dir: String,
    pub scene_file: String,
    pub vertex_shader: String,
    pub fragment_shader: String,
    pub window: WindowConfig,
    pub camera: CameraConfig,
    pub clear_color: [f32; 4],
}

#[derive(Clone, Debug, PartialEq)]
pub struct WindowConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub vsync: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct CameraConfig {
    pub position: Vec3,
    pub target: Vec3,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub move_speed: f32,
    pub mouse_sensitivity: f32,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            resource_dir: None,
            asset_dir: "knight".to_string(),
            scene_file: "knight.obj".to_string(),
            vertex_shader: "res/shaders/mesh_vert.glsl".to_string(),
            fragment_shader: "res/shaders/mesh_frag.glsl".to_string(),
            window: WindowConfig {
                title: env!("CARGO_PKG_NAME").to_string(),
                width: 800,
                height: 600,
                vsync: true,
            },
            camera: CameraConfig {
                position: Vec3::new(0.0, 5.0, 10.0),
                target: Vec3::ZERO,
                fov_degrees: 45.0,
                near: 0.1,
                far: 1000.0,
                move_speed: 1.0,
                mouse_sensitivity: 0.005,
            },
            clear_color: [0.2, 0.2, 0.2, 1.0],
        }
    }
}

type JsonObject = HashMap<String, JsonValue>;

impl Config {
    pub fn load(path: &Path) -> Result<Config, Error> {
        let text = std::fs::read_to_string(path).map_err(|err| Error::resource(path, err))?;
        Config::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Config, Error> {
        let json: JsonValue = text
            .parse()
            .map_err(|err| Error::Config(format!("{err}")))?;
        let root = json
            .get::<JsonObject>()
            .ok_or_else(|| Error::Config("top level value must be an object".to_string()))?;

        let mut config = Config::default();
        if let Some(dir) = take_string(root, "resource_dir")? {
            config.resource_dir = Some(PathBuf::from(dir));
        }
        if let Some(dir) = take_string(root, "asset_dir")? {
            config.asset_dir = dir;
        }
        if let Some(file) = take_string(root, "scene_file")? {
            config.scene_file = file;
        }
        if let Some(file) = take_string(root, "vertex_shader")? {
            config.vertex_shader = file;
        }
        if let Some(file) = take_string(root, "fragment_shader")? {
            config.fragment_shader = file;
        }
        if let Some(color) = take_floats::<4>(root, "clear_color")? {
            config.clear_color = color;
        }

        if let Some(window) = take_object(root, "window")? {
            let config = &mut config.window;
            if let Some(title) = take_string(window, "title")? {
                config.title = title;
            }
            if let Some(width) = take_number(window, "width")? {
                config.width = width as u32;
            }
            if let Some(height) = take_number(window, "height")? {
                config.height = height as u32;
            }
            if let Some(vsync) = take_bool(window, "vsync")? {
                config.vsync = vsync;
            }
        }

        if let Some(camera) = take_object(root, "camera")? {
            let config = &mut config.camera;
            if let Some(position) = take_floats::<3>(camera, "position")? {
                config.position = Vec3::from_array(position);
            }
            if let Some(target) = take_floats::<3>(camera, "target")? {
                config.target = Vec3::from_array(target);
            }
            let scalars = [
                ("fov_degrees", &mut config.fov_degrees),
                ("near", &mut config.near),
                ("far", &mut config.far),
                ("move_speed", &mut config.move_speed),
                ("mouse_sensitivity", &mut config.mouse_sensitivity),
            ];
            for (key, value) in scalars {
                if let Some(number) = take_number(camera, key)? {
                    *value = number as f32;
                }
            }
        }

        if config.window.width == 0 || config.window.height == 0 {
            return Err(Error::Config("window size must be non-zero".to_string()));
        }
        Ok(config)
    }
}

fn type_error(key: &str, expected: &str) -> Error {
    Error::Config(format!("\"{key}\" must be {expected}"))
}

fn take<'a, T: tinyjson::InnerAsRef>(
    object: &'a JsonObject,
    key: &str,
    expected: &str,
) -> Result<Option<&'a T>, Error> {
    match object.get(key) {
        None => Ok(None),
        Some(value) => value
            .get::<T>()
            .map(Some)
            .ok_or_else(|| type_error(key, expected)),
    }
}

fn take_string(object: &JsonObject, key: &str) -> Result<Option<String>, Error> {
    Ok(take::<String>(object, key, "a string")?.cloned())
}

fn take_number(object: &JsonObject, key: &str) -> Result<Option<f64>, Error> {
    Ok(take::<f64>(object, key, "a number")?.copied())
}

fn take_bool(object: &JsonObject, key: &str) -> Result<Option<bool>, Error> {
    Ok(take::<bool>(object, key, "a boolean")?.copied())
}

fn take_object<'a>(object: &'a JsonObject, key: &str) -> Result<Option<&'a JsonObject>, Error> {
    take::<JsonObject>(object, key, "an object")
}

fn take_floats<const N: usize>(object: &JsonObject, key: &str) -> Result<Option<[f32; N]>, Error> {
    let expected = format!("an array of {N} numbers");
    let Some(values) = take::<Vec<JsonValue>>(object, key, &expected)? else {
        return Ok(None);
    };
    if values.len() != N {
        return Err(type_error(key, &expected));
    }
    let mut floats = [0.0; N];
    for (float, value) in floats.iter_mut().zip(values) {
        *float = *value.get::<f64>().ok_or_else(|| type_error(key, &expected))? as f32;
    }
    Ok(Some(floats))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_gives_defaults() {
        assert_eq!(Config::default(), Config::from_json("{}").unwrap());
    }

    #[test]
    fn overrides_are_applied() {
        let config = Config::from_json(
            r#"{
                "resource_dir": "/data",
                "asset_dir": "sponza",
                "scene_file": "sponza.obj",
                "clear_color": [0, 0, 0, 1],
                "window": { "width": 1280, "vsync": false },
                "camera": { "position": [1, 2, 3], "fov_degrees": 60, "move_speed": 0.5 },
                "unrelated": true
            }"#,
        )
        .unwrap();

        assert_eq!(Some(PathBuf::from("/data")), config.resource_dir);
        assert_eq!("sponza", config.asset_dir);
        assert_eq!("sponza.obj", config.scene_file);
        assert_eq!([0.0, 0.0, 0.0, 1.0], config.clear_color);
        assert_eq!(1280, config.window.width);
        assert_eq!(600, config.window.height);
        assert!(!config.window.vsync);
        assert_eq!(Vec3::new(1.0, 2.0, 3.0), config.camera.position);
        assert_eq!(60.0, config.camera.fov_degrees);
        assert_eq!(0.5, config.camera.move_speed);
        assert_eq!(0.1, config.camera.near);
    }

    #[test]
    fn wrong_types_are_rejected() {
        assert!(matches!(
            Config::from_json(r#"{ "scene_file": 3 }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "camera": { "position": [1, 2] } }"#),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{ "window": { "width": 0 } }"#),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn malformed_json_is_rejected() {
        assert!(matches!(Config::from_json("{"), Err(Error::Config(_))));
        assert!(matches!(Config::from_json("[]"), Err(Error::Config(_))));
    }
}
