use rand::seq::SliceRandom;
use twenty48::engine::Game;

fn main() {
    let mut rng = rand::thread_rng();
    let mut game = Game::new(&mut rng);
    println!("{}", game);
    let mut move_count = 0;
    loop {
        let available = game.available_moves();
        let direction = match available.choose(&mut rng) {
            Some(&dir) => dir,
            None => break,
        };
        move_count += 1;
        let result = game.apply_move(direction, &mut rng);
        println!("{}", game);
        if result.game_over {
            break;
        }
    }
    println!(
        "Moves made: {}, final score: {}, highest tile: {}",
        move_count,
        game.score(),
        game.highest_tile()
    )
}
