use crate::theme::Palette;
use gloo::events::EventListener;
use gloo::timers::callback::Interval;
use sapper_core as game;
use wasm_bindgen::JsCast;
use yew::prelude::*;

/// Helper function to use JavaScript's Math.random
fn js_random_seed() -> u64 {
    use js_sys::Math::random;
    u64::from_be_bytes([
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
        (256. * random()) as u8,
    ])
}

/// DOM `MouseEvent.button` to the buttons the game cares about.
fn pointer_button(button: i16) -> game::PointerButton {
    match button {
        0 => game::PointerButton::Primary,
        2 => game::PointerButton::Secondary,
        _ => game::PointerButton::Other,
    }
}

/// Only single-character keys are forwarded, so "Shift" or "Enter" never reach the controller.
fn key_char(key: &str) -> Option<char> {
    let mut chars = key.chars();
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

/// Text drawn in the status margin.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct StatusLine {
    pub time: String,
    pub mines: String,
    pub banner: Option<(&'static str, bool)>,
}

impl StatusLine {
    pub(crate) const RESTART_HINT: &'static str = "Press R to restart";

    fn new(elapsed_secs: u64, mines_left: isize, outcome: game::Outcome) -> Self {
        let banner = match outcome {
            game::Outcome::InProgress => None,
            game::Outcome::Won => Some(("YOU WIN!", true)),
            game::Outcome::Lost => Some(("GAME OVER!", false)),
        };
        Self {
            time: format!("Time: {elapsed_secs}"),
            mines: format!("Mines: {mines_left}"),
            banner,
        }
    }

    fn from_engine(engine: &game::PlayEngine) -> Self {
        Self::new(engine.elapsed_secs(), engine.mines_left(), engine.outcome())
    }
}

/// Inline css placing one tile on the board.
fn tile_style(tile: game::Tile, coords: game::Coord2, geometry: game::BoardGeometry, palette: &Palette) -> String {
    let (left, top) = geometry.cell_origin(coords);
    let size = geometry.cell_size;
    let color = match tile {
        game::Tile::Open(count) => palette.number(count).unwrap_or(palette.text),
        game::Tile::Flag | game::Tile::IncorrectFlag => palette.flag,
        game::Tile::Exploded | game::Tile::Mine => palette.mine,
        game::Tile::Closed => palette.text,
    };
    format!(
        "position: absolute; box-sizing: border-box; left: {left}px; top: {top}px; width: {size}px; height: {size}px; \
         line-height: {size}px; text-align: center; font: bold {}px arial; color: {}; {}",
        size / 2,
        color.css(),
        palette.face_css(tile),
    )
}

fn tile_label(tile: game::Tile) -> Html {
    use game::Tile::*;
    match tile {
        Closed | Open(0) => html! {},
        Open(count) => html! { {count.to_string()} },
        Flag => html! { {"⚑"} },
        IncorrectFlag => html! { {"✕"} },
        Exploded | Mine => html! { {"●"} },
    }
}

pub(crate) enum Msg {
    Input(game::InputEvent),
    UpdateTime,
}

#[derive(Properties, Debug, Clone, PartialEq)]
pub(crate) struct GameProps {
    #[prop_or_default]
    pub seed: Option<u64>,
    #[prop_or_default]
    pub config: game::GameConfig,
    #[prop_or_default]
    pub geometry: game::BoardGeometry,
    #[prop_or_default]
    pub palette: Palette,
}

#[derive(Debug)]
pub(crate) struct GameView {
    engine: game::PlayEngine,
    controller: game::Controller,
    palette: Palette,
    board_ref: NodeRef,
    prev_time: u64,
    _timer_interval: Interval,
    _key_listener: EventListener,
}

impl GameView {
    fn create_timer(ctx: &Context<Self>) -> Interval {
        let link = ctx.link().clone();
        // ~30 fps
        Interval::new(33, move || link.send_message(Msg::UpdateTime))
    }

    fn create_key_listener(ctx: &Context<Self>) -> EventListener {
        let link = ctx.link().clone();
        EventListener::new(&gloo::utils::document(), "keydown", move |event| {
            let Some(event) = event.dyn_ref::<web_sys::KeyboardEvent>() else {
                return;
            };
            if let Some(key) = key_char(&event.key()) {
                link.send_message(Msg::Input(game::InputEvent::Key(key)));
            }
        })
    }

    fn view_status(&self) -> Html {
        let geometry = self.controller.geometry();
        let palette = &self.palette;

        let StatusLine { time, mines, banner } = StatusLine::from_engine(&self.engine);
        let bar_style = format!(
            "position: absolute; left: 0; right: 0; top: 0; height: {}px; display: flex; \
             align-items: center; justify-content: space-between; padding: 0 10px; \
             font: bold 30px arial; color: {};",
            geometry.margin,
            palette.text.css(),
        );

        html! {
            <nav style={bar_style}>
                <aside>{time}</aside>
                {
                    match banner {
                        Some((text, won)) => {
                            let color = if won { palette.won } else { palette.lost };
                            html! { <strong style={format!("font-size: 40px; color: {};", color.css())}>{text}</strong> }
                        }
                        None => html! {},
                    }
                }
                <aside>{mines}</aside>
            </nav>
        }
    }
}

impl Component for GameView {
    type Message = Msg;
    type Properties = GameProps;

    fn create(ctx: &Context<Self>) -> Self {
        let props = ctx.props();
        let seed = props.seed.unwrap_or_else(js_random_seed);
        log::debug!("seed: {}, config: {:?}", seed, props.config);

        Self {
            engine: game::PlayEngine::with_seed(props.config, seed),
            controller: game::Controller::new(props.geometry),
            palette: props.palette,
            board_ref: NodeRef::default(),
            prev_time: 0,
            _timer_interval: GameView::create_timer(ctx),
            _key_listener: GameView::create_key_listener(ctx),
        }
    }

    fn update(&mut self, _ctx: &Context<Self>, msg: Self::Message) -> bool {
        match msg {
            Msg::Input(event) => {
                log::trace!("input: {:?}", event);
                self.controller.handle(&mut self.engine, event)
            }
            Msg::UpdateTime => {
                let time = self.engine.elapsed_secs();
                if self.prev_time != time {
                    self.prev_time = time;
                    true
                } else {
                    false
                }
            }
        }
    }

    fn view(&self, ctx: &Context<Self>) -> Html {
        let geometry = self.controller.geometry();
        let size = self.engine.size();
        let (width, height) = geometry.canvas_size(size);

        let onmousedown = {
            let board_ref = self.board_ref.clone();
            let link = ctx.link().clone();
            Callback::from(move |e: MouseEvent| {
                let Some(board) = board_ref.cast::<web_sys::Element>() else {
                    log::error!("board element is not mounted");
                    return;
                };
                let rect = board.get_bounding_client_rect();
                let position = (
                    e.client_x() - rect.left() as i32,
                    e.client_y() - rect.top() as i32,
                );
                let button = pointer_button(e.button());
                log::trace!("mouse down at {:?} ({:?})", position, button);
                link.send_message(Msg::Input(game::InputEvent::Pointer { position, button }));
            })
        };

        let board_style = format!(
            "position: relative; width: {width}px; height: {height}px; background: {}; user-select: none;",
            self.palette.background.css(),
        );

        html! {
            <div
                class="sapper"
                ref={self.board_ref.clone()}
                style={board_style}
                {onmousedown}
                oncontextmenu={Callback::from(move |e: MouseEvent| e.prevent_default())}
            >
                { self.view_status() }
                {
                    for (0..size.1).flat_map(|y| (0..size.0).map(move |x| (x, y))).map(|coords| {
                        let tile = self.engine.tile_at(coords);
                        let style = tile_style(tile, coords, geometry, &self.palette);
                        html! { <div class="cell" {style}>{ tile_label(tile) }</div> }
                    })
                }
                {
                    if self.engine.is_finished() {
                        let hint_style = format!(
                            "position: absolute; left: 0; right: 0; bottom: 20px; text-align: center; \
                             font: bold 30px arial; color: {};",
                            self.palette.text.css(),
                        );
                        html! { <p style={hint_style}>{StatusLine::RESTART_HINT}</p> }
                    } else {
                        html! {}
                    }
                }
            </div>
        }
    }
}
