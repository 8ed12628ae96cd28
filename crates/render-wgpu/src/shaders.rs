/// Uniform block shared by both pipelines. Must match `Uniforms` in gpu.rs.
const UNIFORMS: &str = r#"
struct Uniforms {
    view_proj: mat4x4<f32>,
    model: mat4x4<f32>,
    ambient: vec4<f32>,
    light_dir: vec4<f32>,
    light_color: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: Uniforms;

@group(1) @binding(0)
var t_color: texture_2d<f32>;
@group(1) @binding(1)
var s_color: sampler;
"#;

/// Unlit textured box seen from the inside.
const SKYBOX_BODY: &str = r#"
struct SkyVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct SkyOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
};

@vertex
fn vs_sky(vertex: SkyVertex) -> SkyOutput {
    var out: SkyOutput;
    out.clip_position = uniforms.view_proj * vec4<f32>(vertex.position, 1.0);
    out.uv = vertex.uv;
    return out;
}

@fragment
fn fs_sky(in: SkyOutput) -> @location(0) vec4<f32> {
    return vec4<f32>(textureSample(t_color, s_color, in.uv).rgb, 1.0);
}
"#;

/// Garment lit by one ambient and one directional light. The paint texture's
/// alpha is ignored: unpainted texels show their (black) color.
const MODEL_BODY: &str = r#"
struct ModelVertex {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct ModelOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_normal: vec3<f32>,
    @location(1) uv: vec2<f32>,
};

@vertex
fn vs_model(vertex: ModelVertex) -> ModelOutput {
    let world_pos = uniforms.model * vec4<f32>(vertex.position, 1.0);
    let world_normal = (uniforms.model * vec4<f32>(vertex.normal, 0.0)).xyz;

    var out: ModelOutput;
    out.clip_position = uniforms.view_proj * world_pos;
    out.world_normal = world_normal;
    out.uv = vec2<f32>(vertex.uv.x, 1.0 - vertex.uv.y);
    return out;
}

@fragment
fn fs_model(in: ModelOutput) -> @location(0) vec4<f32> {
    let base = textureSample(t_color, s_color, in.uv).rgb;
    let n = normalize(in.world_normal);
    let diffuse = max(dot(n, uniforms.light_dir.xyz), 0.0);
    let lighting = uniforms.ambient.rgb + uniforms.light_color.rgb * diffuse;
    return vec4<f32>(base * lighting, 1.0);
}
"#;

pub fn skybox_shader() -> String {
    format!("{UNIFORMS}{SKYBOX_BODY}")
}

pub fn model_shader() -> String {
    format!("{UNIFORMS}{MODEL_BODY}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shaders_declare_their_entry_points() {
        let sky = skybox_shader();
        assert!(sky.contains("fn vs_sky") && sky.contains("fn fs_sky"));
        let model = model_shader();
        assert!(model.contains("fn vs_model") && model.contains("fn fs_model"));
        assert!(model.contains("1.0 - vertex.uv.y"));
    }
}
