use crmseed_generate::StrategyTable;

fn main() {
    let table = StrategyTable::standard();
    for id in table.ids() {
        println!("{id}");
    }
}
