use ndarray::arr2;
use simdoe_sampling::{MorrisOat, Nolh, NolhCatalogue, Random, SamplingMethod};

fn main() {
    let xlimits = arr2(&[[0., 1.], [-10., 10.], [5., 15.]]);
    let n = 10;

    println!("Sampling space");
    println!("{xlimits}\n");

    println!("*** using random sampling, {n} samples");
    let samples = Random::new(&xlimits).sample(n).unwrap();
    println!("{samples}\n");

    let catalogue = NolhCatalogue::new();
    let table = catalogue.find(xlimits.nrows()).unwrap();
    println!(
        "*** using NOLH sampling, tables valid for {} factors: {}",
        xlimits.nrows(),
        catalogue.describe_valid_tables(xlimits.nrows())
    );
    let samples = Nolh::new(&xlimits, table).sample(table.n1()).unwrap();
    println!("{samples}\n");

    println!("*** using Morris OAT sampling, 3 trajectories out of 20");
    let samples = MorrisOat::new(&xlimits)
        .levels(4)
        .jump(2)
        .pool_size(20)
        .trajectories(3)
        .unwrap();
    println!("{samples}\n");
}
