//! WGSL for the scene pass.

/// Scene shader: unlit, standard (GGX) and Phong shading selected per draw,
/// point and ambient lights, derivative-based bump mapping and linear fog.
///
/// Group 0 holds the per-frame uniform; group 1 holds the per-object uniform,
/// base color texture, bump texture and the shared repeat sampler. Missing
/// textures are bound as a white texel, so both samples always run.
pub const SCENE_SHADER_SOURCE: &str = r#"
const PI: f32 = 3.14159265359;
const MAX_POINT_LIGHTS: u32 = 4u;
const PHONG_SHININESS: f32 = 30.0;
const PHONG_SPECULAR: vec3<f32> = vec3<f32>(0.0056);

struct FrameUniform {
    view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    camera_forward: vec4<f32>,
    ambient: vec4<f32>,
    fog_color: vec4<f32>,
    // x = fog near, y = fog far, z = fog enabled, w = point light count
    params: vec4<f32>,
    point_positions: array<vec4<f32>, 4>,
    point_colors: array<vec4<f32>, 4>,
};

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    color: vec4<f32>,
    // x = roughness, y = metalness, z = bump scale, w = shading model
    surface: vec4<f32>,
    // xy = uv repeat, z = has base texture, w = has bump map
    uv_repeat_flags: vec4<f32>,
};

@group(0) @binding(0)
var<uniform> frame: FrameUniform;

@group(1) @binding(0)
var<uniform> object: ObjectUniform;
@group(1) @binding(1)
var base_texture: texture_2d<f32>;
@group(1) @binding(2)
var bump_texture: texture_2d<f32>;
@group(1) @binding(3)
var texture_sampler: sampler;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    let world = object.model * vec4<f32>(in.position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    // Geometry v grows upward, image rows grow downward.
    let repeat = object.uv_repeat_flags.xy;
    out.uv = vec2<f32>(in.uv.x * repeat.x, 1.0 - in.uv.y * repeat.y);
    return out;
}

// --- Shading models ---

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / (PI * denom * denom);
}

fn geometry_schlick_ggx(n_dot: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = (r * r) / 8.0;
    return n_dot / (n_dot * (1.0 - k) + k);
}

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (1.0 - f0) * pow(clamp(1.0 - cos_theta, 0.0, 1.0), 5.0);
}

fn standard_brdf(
    light_dir: vec3<f32>,
    view_dir: vec3<f32>,
    normal: vec3<f32>,
    albedo: vec3<f32>,
    metallic: f32,
    roughness: f32,
) -> vec3<f32> {
    let half_vec = normalize(view_dir + light_dir);
    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let n_dot_v = max(dot(normal, view_dir), 0.0);
    let n_dot_h = max(dot(normal, half_vec), 0.0);
    let h_dot_v = max(dot(half_vec, view_dir), 0.0);

    let f0 = mix(vec3<f32>(0.04), albedo, metallic);
    let d = distribution_ggx(n_dot_h, max(roughness, 0.04));
    let g = geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness);
    let f = fresnel_schlick(h_dot_v, f0);

    let specular = d * g * f / (4.0 * n_dot_v * n_dot_l + 0.0001);
    let k_d = (vec3<f32>(1.0) - f) * (1.0 - metallic);

    // Light intensities are unitless, so the Lambert 1/PI is folded back in.
    return (k_d * albedo + specular * PI) * n_dot_l;
}

fn phong_brdf(
    light_dir: vec3<f32>,
    view_dir: vec3<f32>,
    normal: vec3<f32>,
    albedo: vec3<f32>,
) -> vec3<f32> {
    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let n_dot_h = max(dot(normal, normalize(view_dir + light_dir)), 0.0);
    let specular = PHONG_SPECULAR * pow(n_dot_h, PHONG_SHININESS);
    return (albedo + specular) * n_dot_l;
}

/// Distance falloff; `range == 0` means none.
fn point_attenuation(dist: f32, range: f32) -> f32 {
    if range <= 0.0 {
        return 1.0;
    }
    return clamp(1.0 - dist / range, 0.0, 1.0);
}

fn perturb_normal(
    dpos_dx: vec3<f32>,
    dpos_dy: vec3<f32>,
    normal: vec3<f32>,
    dh: vec2<f32>,
    face: f32,
) -> vec3<f32> {
    let sigma_x = normalize(dpos_dx);
    let sigma_y = normalize(dpos_dy);
    let r1 = cross(sigma_y, normal);
    let r2 = cross(normal, sigma_x);
    let det = dot(sigma_x, r1) * face;
    let grad = sign(det) * (dh.x * r1 + dh.y * r2);
    return normalize(abs(det) * normal - grad);
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front_facing: bool) -> @location(0) vec4<f32> {
    // Sampling and derivatives stay in uniform control flow.
    let base = textureSample(base_texture, texture_sampler, in.uv);
    let duv_dx = dpdx(in.uv);
    let duv_dy = dpdy(in.uv);
    let h = textureSample(bump_texture, texture_sampler, in.uv).x;
    let h_dx = textureSample(bump_texture, texture_sampler, in.uv + duv_dx).x;
    let h_dy = textureSample(bump_texture, texture_sampler, in.uv + duv_dy).x;
    let dpos_dx = dpdx(in.world_position);
    let dpos_dy = dpdy(in.world_position);

    let albedo = object.color.rgb * base.rgb;
    let alpha = object.color.a * base.a;
    let model = u32(object.surface.w + 0.5);

    var color = albedo;
    if model != 0u {
        let face = select(-1.0, 1.0, front_facing);
        var normal = normalize(in.world_normal) * face;
        let bump_scale = object.surface.z * object.uv_repeat_flags.w;
        if bump_scale > 0.0 {
            normal = perturb_normal(dpos_dx, dpos_dy, normal, vec2<f32>(h_dx - h, h_dy - h) * bump_scale, face);
        }

        let view_dir = normalize(frame.camera_position.xyz - in.world_position);
        let roughness = object.surface.x;
        let metallic = object.surface.y;
        let diffuse_albedo = select(albedo, albedo * (1.0 - metallic), model == 1u);

        color = frame.ambient.rgb * diffuse_albedo;
        let count = min(u32(frame.params.w + 0.5), MAX_POINT_LIGHTS);
        for (var i = 0u; i < count; i++) {
            let to_light = frame.point_positions[i].xyz - in.world_position;
            let light_dir = normalize(to_light);
            let radiance = frame.point_colors[i].rgb
                * point_attenuation(length(to_light), frame.point_positions[i].w);
            if model == 1u {
                color += standard_brdf(light_dir, view_dir, normal, albedo, metallic, roughness) * radiance;
            } else {
                color += phong_brdf(light_dir, view_dir, normal, albedo) * radiance;
            }
        }
    }

    if frame.params.z > 0.5 {
        let depth = dot(in.world_position - frame.camera_position.xyz, frame.camera_forward.xyz);
        let near = frame.params.x;
        let far = frame.params.y;
        var fog = select(0.0, 1.0, depth >= far);
        if far > near {
            fog = clamp((depth - near) / (far - near), 0.0, 1.0);
        }
        color = mix(color, frame.fog_color.rgb, fog);
    }

    return vec4<f32>(color, alpha);
}
"#;
