//! Stepwise Viewer - opens a glTF model and runs its assembly guide

use anyhow::Result;
use bevy::prelude::*;
use bevy_egui::EguiPlugin;
use bevy_picking::DefaultPickingPlugins;
use clap::Parser;
use std::path::PathBuf;
use stepwise_scene::{AssemblySettings, StepwisePlugin};

#[derive(Parser, Debug)]
#[command(name = "stepwise-viewer")]
#[command(about = "Step-by-step exploded-view assembly guide for glTF models")]
#[command(version)]
struct Args {
    /// glTF/glb model holding the model root, anchors and indicators
    model: String,

    /// Path to configuration file
    #[arg(short, long, default_value = "stepwise.toml")]
    config: PathBuf,

    /// Model root name, overrides the configured one
    #[arg(short, long)]
    root: Option<String>,
}

#[derive(Resource)]
struct ModelPath(String);

fn main() -> Result<()> {
    let args = Args::parse();

    let mut settings = if args.config.exists() {
        AssemblySettings::load(&args.config)?
    } else {
        AssemblySettings::default()
    };
    if let Some(root) = args.root {
        settings.root = root;
    }

    App::new()
        .insert_resource(ClearColor(Color::srgb(0.1, 0.1, 0.15)))
        .insert_resource(settings)
        .insert_resource(ModelPath(args.model))
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Stepwise".to_string(),
                        ..default()
                    }),
                    ..default()
                })
                .set(AssetPlugin {
                    // Model paths are given relative to the working directory
                    file_path: "".to_string(),
                    ..default()
                }),
        )
        // Must be added before EguiPlugin so it can detect PickingPlugin
        .add_plugins(DefaultPickingPlugins)
        .add_plugins(EguiPlugin::default())
        .add_plugins(StepwisePlugin)
        .add_systems(Startup, setup_scene)
        .run();

    Ok(())
}

fn setup_scene(mut commands: Commands, asset_server: Res<AssetServer>, model: Res<ModelPath>) {
    commands.spawn((
        Camera3d::default(),
        Transform::from_xyz(1.6, 1.4, 2.2).looking_at(Vec3::new(0.0, 0.4, 0.0), Vec3::Y),
    ));

    commands.spawn((
        DirectionalLight {
            illuminance: 8_000.0,
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(3.0, 6.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    commands.spawn(SceneRoot(
        asset_server.load(GltfAssetLabel::Scene(0).from_asset(model.0.clone())),
    ));
}
