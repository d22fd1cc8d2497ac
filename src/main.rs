use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::json;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use rayward::camera::Camera;
use rayward::color::RGB;
use rayward::light::PointLight;
use rayward::render::RenderConfig;
use rayward::render::RenderJob;
use rayward::scene::load_scene;
use rayward::three_d::Phong;
use rayward::three_d::Plane;
use rayward::three_d::Sphere;
use rayward::vec3::Float;
use rayward::vec3::Point;
use rayward::vec3::Vec3;

#[derive(Parser, Debug)]
#[command(name = "rayward", about = "recursive phong ray tracer")]
struct Options {
    #[arg(short = 'l', long, default_value = "scene.json")]
    scene_file: PathBuf,
    #[arg(short = 'o', long, default_value = "pic.png")]
    img_file: PathBuf,
    #[arg(short = 'x', long, default_value_t = 0)]
    res_x: u32,
    #[arg(short = 'y', long, default_value_t = 0)]
    res_y: u32,
    #[arg(short = 'b', long, default_value_t = 5)]
    bounces: u32,
    #[arg(long, default_value_t = 1)]
    shadow_rays: u32,
    #[arg(long, default_value_t = 0.0)]
    light_size: Float,
    #[arg(long)]
    use_dof: bool,
    #[arg(long, default_value_t = 5)]
    dof_rays: u32,
    #[arg(long, default_value_t = 8.8)]
    dof_focal_plane: Float,
    #[arg(long, default_value_t = 0.3)]
    dof_amount: Float,
    #[arg(long, default_value_t = 0)]
    seed: u64,
    #[arg(short = 'n', long, default_value_t = 0)]
    gen_spheres: u32,
}

fn generate_scene(num_spheres: u32, scene_file: &Path, seed: u64) -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(seed);

    println!("Generating scene w/ {} spheres", num_spheres);
    let mut json = json!({ "resolution": [800, 600] });
    json["camera"] = serde_json::to_value(Camera::new(
        Point::new(-6.0, 0.0, 1.0),
        Vec3::new(1.0, 0.0, -0.15),
        Vec3::new(0.0, 0.0, 1.0),
        55.0,
    ))?;
    json["ambient"] = json!({
        "rgb": { "r": 1.0, "g": 1.0, "b": 1.0 },
        "intensity": 0.02
    });
    json["point-light.0"] = serde_json::to_value(PointLight::new(
        Point::new(0.5, 2.5, 4.0),
        RGB::white(),
        150.0,
    ))?;
    json["point-light.1"] = serde_json::to_value(PointLight::new(
        Point::new(0.5, -3.0, 2.0),
        RGB {
            r: 0.8,
            g: 0.3,
            b: 0.8,
        },
        80.0,
    ))?;
    json["plane.0"] = serde_json::to_value(Plane {
        point: Point::new(0.0, 0.0, -1.0),
        normal: Vec3::new(0.0, 0.0, 1.0),
        color: RGB::uniform(0.6),
        phong: Phong {
            kd: 0.7,
            ks: 0.2,
            alpha: 5.0,
        },
        reflectivity: 0.1,
    })?;

    for i in 0..num_spheres {
        let sphere = Sphere {
            center: Point::new(
                rng.gen_range(1.0..5.0),
                rng.gen_range(-2.5..2.5),
                rng.gen_range(-0.8..1.5),
            ),
            radius: rng.gen_range(0.2..0.6),
            color: RGB {
                r: rng.gen_range(0.3..1.0),
                g: rng.gen_range(0.3..1.0),
                b: rng.gen_range(0.3..1.0),
            },
            phong: Phong::default(),
            reflectivity: rng.gen_range(0.0..0.6),
        };
        json[format!("sphere.{i}")] = serde_json::to_value(sphere)?;
    }

    let s = serde_json::to_string_pretty(&json)?;
    println!("Writing scene file {}", scene_file.display());
    fs::write(scene_file, s)?;
    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let opt = Options::parse();

    if opt.gen_spheres > 0 {
        return generate_scene(opt.gen_spheres, &opt.scene_file, opt.seed);
    }

    println!(
        "loading scene file {}",
        opt.scene_file.display().to_string().bold()
    );
    let loaded = load_scene(&opt.scene_file)
        .with_context(|| format!("loading scene {}", opt.scene_file.display()))?;

    let (res_x, res_y) = if opt.res_x > 0 && opt.res_y > 0 {
        (opt.res_x, opt.res_y)
    } else {
        loaded.resolution.unwrap_or((800, 600))
    };
    println!("-- img resolution: {}", format!("{res_x}x{res_y}").bold());
    println!(
        "{}",
        format!("num_threads: {}", rayon::current_num_threads()).red()
    );

    let cfg = RenderConfig {
        res_x,
        res_y,
        bounces: opt.bounces,
        shadow_rays: opt.shadow_rays,
        light_size: opt.light_size,
        use_dof: opt.use_dof,
        dof_rays: opt.dof_rays,
        dof_focal_plane: opt.dof_focal_plane,
        dof_amount: opt.dof_amount,
        background: loaded.background.unwrap_or(RGB::uniform(0.001)),
        seed: opt.seed,
    };

    loaded.camera.display();
    for light in loaded.scene.lights() {
        light.display();
    }

    let job = RenderJob::new(loaded.scene, loaded.camera, cfg).context("render setup")?;

    let exit_req = Arc::new(AtomicBool::new(false));
    let handler_flag = exit_req.clone();
    ctrlc::set_handler(move || handler_flag.store(true, Ordering::SeqCst))
        .context("installing ctrl-c handler")?;

    job.render(exit_req.clone());
    if exit_req.load(Ordering::SeqCst) {
        println!(
            "{}",
            "render interrupted, writing partial image".red().bold()
        );
    }
    job.print_stats();

    job.save_image(&opt.img_file)
        .with_context(|| format!("writing {}", opt.img_file.display()))?;
    println!("wrote {}", opt.img_file.display().to_string().green());
    Ok(())
}
