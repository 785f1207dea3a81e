use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use log::{error, info, warn};
use macroquad::prelude::*;
use ::rand::SeedableRng;
use ::rand::rngs::StdRng;
use tokio::runtime::Runtime;

use temporal_life::{
    Algorithm, Camera, CellState, Config, EvolutionDriver, EvolutionHandle, GameOfLifeAlgorithm,
    TemporalGameOfLifeState, input::{self, Command, PanDrag}, presets, rendering,
    serialization::{self, DeserializationResult},
    ui::{self, Dropdown, PanelAction},
};

#[derive(Parser)]
#[command(name = "temporal-life")]
#[command(version)]
#[command(about = "Conway's Game of Life evolving in real time, with HashLife")]
struct Cli {
    /// Pattern file to load (.cells, .lif, .life or .rle)
    pattern_file: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, default_value = "config.yaml")]
    config: PathBuf,

    /// Step algorithm (naive, naive-parallel, hashlife)
    #[arg(short, long)]
    algorithm: Option<Algorithm>,

    /// Built-in pattern to start from when no file is given
    #[arg(short, long, default_value = "Gosper Glider Gun")]
    pattern: String,

    /// Where the save key writes the current pattern
    #[arg(short, long, default_value = "saved.rle")]
    output: PathBuf,

    /// Start evolving immediately
    #[arg(long)]
    run: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let mut config = if cli.config.exists() {
        info!("Loading config from: {}", cli.config.display());
        Config::from_file(&cli.config)?
    } else {
        info!("Using default configuration");
        Config::default()
    };
    if let Some(algorithm) = cli.algorithm {
        config.evolution.algorithm = algorithm;
    }

    let initial = load_pattern(&cli)?;
    let state = TemporalGameOfLifeState::with_settings(
        initial,
        config.evolution.generations_per_step,
        config.evolution.target_steps_per_second,
    )?;

    let conf = Conf {
        window_title: "Temporal Life".to_owned(),
        window_width: config.viewer.window_width,
        window_height: config.viewer.window_height,
        window_resizable: true,
        ..Default::default()
    };
    let runtime = tokio::runtime::Builder::new_multi_thread().enable_time().build()?;
    let run = cli.run;
    let output = cli.output;
    macroquad::Window::from_config(conf, async move {
        let viewer = Viewer::new(&runtime, config, state, output);
        viewer.state.set_is_running(run);
        viewer.run().await;
    });
    Ok(())
}

fn load_pattern(cli: &Cli) -> Result<CellState, Box<dyn std::error::Error>> {
    let Some(path) = &cli.pattern_file else {
        let pattern = presets::by_name(&cli.pattern)
            .ok_or_else(|| format!("unknown built-in pattern: {}", cli.pattern))?;
        info!("Starting from {}", pattern.name);
        return Ok(pattern.cell_state());
    };

    match serialization::read_file(path)? {
        DeserializationResult::Successful { cell_state, warnings } => {
            for warning in &warnings {
                warn!("{}: {warning}", path.display());
            }
            info!("Loaded {} alive cells from {}", cell_state.population(), path.display());
            Ok(cell_state)
        }
        DeserializationResult::Unsuccessful { errors, .. } => {
            for message in &errors {
                error!("{}: {message}", path.display());
            }
            Err(format!("could not read {}", path.display()).into())
        }
    }
}

struct Viewer<'rt> {
    runtime: &'rt Runtime,
    config: Config,
    state: TemporalGameOfLifeState,
    algorithm: Algorithm,
    stepper: Arc<dyn GameOfLifeAlgorithm>,
    driver: Option<EvolutionHandle>,
    camera: Camera,
    pan: PanDrag,
    rng: StdRng,
    output: PathBuf,
    algorithm_dropdown: Dropdown,
    pattern_dropdown: Dropdown,
    pending_pattern: Option<usize>,
}

impl<'rt> Viewer<'rt> {
    fn new(runtime: &'rt Runtime, config: Config, state: TemporalGameOfLifeState, output: PathBuf) -> Self {
        let algorithm = config.evolution.algorithm;
        let algorithms = Algorithm::all();
        let mut algorithm_dropdown = Dropdown::new(
            ui::panel_x() + 5.0,
            25.0,
            ui::PANEL_WIDTH - 10.0,
            "Algorithm",
            algorithms.iter().map(|a| a.name().to_string()).collect(),
        );
        algorithm_dropdown.set_selected(algorithms.iter().position(|a| *a == algorithm).unwrap_or(0));
        let pattern_dropdown = Dropdown::new(
            ui::panel_x() + 5.0,
            80.0,
            ui::PANEL_WIDTH - 10.0,
            "Place pattern",
            presets::all_patterns().iter().map(|p| p.name.to_string()).collect(),
        );

        let mut viewer = Self {
            runtime,
            stepper: algorithm.build(config.hashlife.max_cache_entries),
            config,
            state,
            algorithm,
            driver: None,
            camera: Camera::new(),
            pan: PanDrag::default(),
            rng: StdRng::from_os_rng(),
            output,
            algorithm_dropdown,
            pattern_dropdown,
            pending_pattern: None,
        };
        viewer.spawn_driver();
        viewer.frame_view();
        viewer
    }

    fn spawn_driver(&mut self) {
        if let Some(previous) = self.driver.take() {
            previous.cancel();
        }
        let _guard = self.runtime.enter();
        let driver = EvolutionDriver::new(Arc::clone(&self.stepper))
            .rate_window(self.config.evolution.rate_window);
        self.driver = Some(driver.spawn(self.state.clone()));
    }

    fn switch_algorithm(&mut self, algorithm: Algorithm) {
        info!("Switching to {algorithm}");
        self.algorithm = algorithm;
        self.stepper = algorithm.build(self.config.hashlife.max_cache_entries);
        self.spawn_driver();
    }

    /// A driver that ended on its own hit a step error; pause and start a fresh one
    fn check_driver(&mut self) {
        let finished = self.driver.as_ref().is_some_and(EvolutionHandle::is_finished);
        if !finished {
            return;
        }
        if let Some(handle) = self.driver.take() {
            self.runtime.spawn(async move {
                if let Err(err) = handle.join().await {
                    error!("Evolution stopped: {err}");
                }
            });
        }
        self.state.set_is_running(false);
        self.spawn_driver();
    }

    fn frame_view(&mut self) {
        match self.state.cell_state().bounding_box() {
            Some(bounds) => self.camera.frame(bounds, ui::grid_viewport(), self.config.viewer.cell_size),
            None => self.camera.reset(),
        }
    }

    fn execute(&mut self, command: Command) {
        match input::apply_setting(&self.state, command) {
            Ok(true) => return,
            Ok(false) => {}
            Err(err) => {
                warn!("{err}");
                return;
            }
        }
        match command {
            Command::Step => {
                if self.state.is_running() {
                    return;
                }
                if let Err(err) = self.state.step_with(self.stepper.as_ref()) {
                    error!("Step failed: {err}");
                }
            }
            Command::Clear => self.state.restart(CellState::empty()),
            Command::Randomize => {
                let (width, height) = ui::grid_viewport();
                let region = self.camera.visible_bounds(width, height, self.config.viewer.cell_size);
                let cells = CellState::random(region, self.config.viewer.random_density, &mut self.rng);
                self.state.restart(cells);
            }
            Command::FrameView => self.frame_view(),
            Command::CycleAlgorithm => {
                let next = self.algorithm.next();
                let index = Algorithm::all().iter().position(|a| *a == next).unwrap_or(0);
                self.algorithm_dropdown.set_selected(index);
                self.switch_algorithm(next);
            }
            Command::Save => match serialization::write_file(&self.output, &self.state.cell_state()) {
                Ok(()) => info!("Saved pattern to {}", self.output.display()),
                Err(err) => error!("{err}"),
            },
            _ => {}
        }
    }

    fn handle_widgets(&mut self, mouse_pos: (f32, f32)) {
        let px = ui::panel_x() + 5.0;
        self.algorithm_dropdown.set_position(px, 25.0);
        self.pattern_dropdown.set_position(px, 80.0);

        if let Some(picked) = self.algorithm_dropdown.update(mouse_pos) {
            match Algorithm::all().get(picked) {
                Some(&algorithm) if algorithm != self.algorithm => self.switch_algorithm(algorithm),
                _ => {}
            }
        }
        if self.algorithm_dropdown.is_open() {
            self.pattern_dropdown.close();
        }

        // Picking a pattern pauses and enters placement mode
        if let Some(picked) = self.pattern_dropdown.update(mouse_pos) {
            self.pending_pattern = Some(picked);
            self.state.set_is_running(false);
        }
        if self.pattern_dropdown.is_open() {
            self.algorithm_dropdown.close();
        }
    }

    fn place_pending_pattern(&mut self, mouse_pos: (f32, f32)) {
        let Some(index) = self.pending_pattern else {
            return;
        };
        if is_mouse_button_pressed(MouseButton::Right) || is_key_pressed(KeyCode::Escape) {
            self.pending_pattern = None;
            return;
        }
        let (width, _) = ui::grid_viewport();
        if is_mouse_button_pressed(MouseButton::Left) && mouse_pos.0 < width {
            if let Some(pattern) = presets::all_patterns().get(index) {
                let origin = rendering::preview_origin(pattern, &self.camera, mouse_pos, self.config.viewer.cell_size);
                match pattern.placed_at(origin) {
                    Some(placed) => self.state.update_cell_state(|cells| cells.union(&placed)),
                    None => warn!("{} does not fit at ({}, {})", pattern.name, origin.x, origin.y),
                }
            }
            self.pending_pattern = None;
        }
    }

    async fn run(mut self) {
        let patterns = presets::all_patterns();
        loop {
            let mouse_pos = mouse_position();
            let viewport = ui::grid_viewport();
            let cell_size = self.config.viewer.cell_size;
            let buttons = ui::create_buttons(150.0);

            self.check_driver();
            self.handle_widgets(mouse_pos);

            let mut commands = input::keyboard_commands();
            commands.extend(
                buttons
                    .iter()
                    .filter(|(_, button)| button.is_clicked(mouse_pos))
                    .map(|(action, _)| match action {
                        PanelAction::PlayPause => Command::ToggleRunning,
                        PanelAction::Step => Command::Step,
                        PanelAction::Clear => Command::Clear,
                        PanelAction::Randomize => Command::Randomize,
                        PanelAction::Frame => Command::FrameView,
                    }),
            );
            if self.pending_pattern.is_some() {
                self.place_pending_pattern(mouse_pos);
            } else {
                commands.extend(input::cell_click(&self.camera, mouse_pos, viewport, cell_size));
            }
            for command in commands {
                self.execute(command);
            }
            input::handle_zoom(&mut self.camera, mouse_pos);
            self.pan.update(&mut self.camera, mouse_pos);

            // One consistent snapshot per frame
            let snapshot = self.state.snapshot();
            clear_background(BLACK);
            rendering::draw_cells(&snapshot.cell_state, &self.camera, viewport, cell_size);
            if let Some(pattern) = self.pending_pattern.and_then(|i| patterns.get(i)) {
                if mouse_pos.0 < viewport.0 {
                    rendering::draw_pattern_preview(pattern, &self.camera, mouse_pos, cell_size);
                }
            }
            let widgets: Vec<_> = buttons.into_iter().map(|(_, button)| button).collect();
            rendering::draw_panel(
                &snapshot,
                self.algorithm.name(),
                &self.camera,
                &widgets,
                &[&self.algorithm_dropdown, &self.pattern_dropdown],
                mouse_pos,
            );

            next_frame().await;
        }
    }
}
