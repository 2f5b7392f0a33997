use bevy::prelude::AppExit;

fn main() -> AppExit {
    slide_puzzle::run()
}
