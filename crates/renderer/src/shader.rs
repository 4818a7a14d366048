//! WGSL source specialised to a mesh's stream component counts.

use crate::frame::StreamBinding;

const TEMPLATE: &str = include_str!("shaders/sbm.wgsl");

/// Components GL substitutes for missing attribute components.
const GL_FILL: [&str; 4] = ["0.0", "0.0", "0.0", "1.0"];

/// WGSL type of a float input with `components` lanes.
fn input_type(components: u32) -> String {
    match components {
        1 => "f32".to_string(),
        n => format!("vec{n}<f32>"),
    }
}

/// Expression converting input `name` to a `vecN<f32>` with `target` lanes.
fn widen(name: &str, components: u32, target: usize) -> String {
    let have = components as usize;
    if have == target {
        name.to_string()
    } else if have > target {
        format!("{name}.{}", &"xyzw"[..target])
    } else {
        let fill = GL_FILL[have..target].join(", ");
        format!("vec{target}<f32>({name}, {fill})")
    }
}

pub fn build_shader(bindings: &[StreamBinding; 3]) -> String {
    let [position, normal, texcoord] = bindings;
    TEMPLATE
        .replace("{{POSITION_TYPE}}", &input_type(position.components))
        .replace("{{NORMAL_TYPE}}", &input_type(normal.components))
        .replace("{{TEXCOORD_TYPE}}", &input_type(texcoord.components))
        .replace("{{POSITION_EXPR}}", &widen("position", position.components, 4))
        .replace("{{NORMAL_EXPR}}", &widen("normal", normal.components, 3))
        .replace("{{TEXCOORD_EXPR}}", &widen("texcoord0", texcoord.components, 2))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binding(location: u32, components: u32) -> StreamBinding {
        StreamBinding {
            location,
            components,
            offset: 0,
            size: 0,
        }
    }

    #[test]
    fn widen_fills_like_gl() {
        assert_eq!(widen("p", 3, 4), "vec4<f32>(p, 1.0)");
        assert_eq!(widen("p", 1, 4), "vec4<f32>(p, 0.0, 0.0, 1.0)");
        assert_eq!(widen("n", 4, 3), "n.xyz");
        assert_eq!(widen("t", 2, 2), "t");
        assert_eq!(widen("t", 1, 2), "vec2<f32>(t, 0.0)");
    }

    #[test]
    fn scalar_inputs_are_f32() {
        assert_eq!(input_type(1), "f32");
        assert_eq!(input_type(3), "vec3<f32>");
    }

    #[test]
    fn shader_has_no_placeholders_left() {
        let src = build_shader(&[binding(0, 4), binding(1, 3), binding(2, 2)]);
        assert!(!src.contains("{{"));
        assert!(src.contains("@location(0) position: vec4<f32>"));
        assert!(src.contains("globals.mvp * position;"));
        assert!(src.contains("out.normal = normal;"));
        assert!(src.contains("let uv = texcoord0;"));
    }

    #[test]
    fn three_component_position_gets_unit_w() {
        let src = build_shader(&[binding(0, 3), binding(1, 4), binding(2, 3)]);
        assert!(src.contains("globals.mvp * vec4<f32>(position, 1.0);"));
        assert!(src.contains("out.normal = normal.xyz;"));
        assert!(src.contains("let uv = texcoord0.xy;"));
    }
}
