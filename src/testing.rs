use rand::Rng;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256StarStar;

use crate::node_size;
use crate::BlockResource;
use crate::ForwardList;
use crate::PoolResource;
use crate::SystemResource;

pub type Item = i32;

// Lets the generic tests build each resource kind from the same knob; the
// system resource has no chunk granularity to configure.
pub trait TestResource: BlockResource + Sized {
    fn for_items(blocks_per_chunk: usize) -> Self;
}

impl TestResource for PoolResource {
    fn for_items(blocks_per_chunk: usize) -> Self {
        return PoolResource::with_chunk_capacity(node_size::<Item>(), blocks_per_chunk)
    }
}

impl TestResource for SystemResource {
    fn for_items(_blocks_per_chunk: usize) -> Self {
        return SystemResource
    }
}

fn new_list<R: TestResource>(blocks_per_chunk: usize) -> ForwardList<Item, R> {
    return ForwardList::new_in(R::for_items(blocks_per_chunk))
}

pub fn test_empty_list<R: TestResource>() {
    let list: ForwardList<Item, R> = new_list(4);
    assert!(list.is_empty());
    assert!(list.len() == 0);
    assert!(list.front().is_none());
    assert!(list.iter().next().is_none());
}

pub fn test_push_then_front<R: TestResource>() {
    let mut list: ForwardList<Item, R> = new_list(4);

    list.push_front(42).unwrap();
    assert!(!list.is_empty());
    assert!(list.len() == 1);
    assert!(*list.front().unwrap() == 42);

    list.push_front(100).unwrap();
    assert!(list.len() == 2);
    assert!(*list.front().unwrap() == 100);
}

pub fn test_lifo_iteration<R: TestResource>() {
    let mut list: ForwardList<Item, R> = new_list(4);
    for value in 1..=6 {
        list.push_front(value).unwrap();
    }

    let front_to_back: Vec<Item> = list.iter().copied().collect();
    assert!(front_to_back == vec![6, 5, 4, 3, 2, 1]);

    // A fresh traversal restarts at the current head.
    let again: Vec<Item> = list.iter().copied().collect();
    assert!(again == front_to_back);
}

pub fn test_pop_on_empty_is_noop<R: TestResource>() {
    let mut list: ForwardList<Item, R> = new_list(4);
    assert!(list.pop_front().is_none());
    assert!(list.len() == 0);
    assert!(list.is_empty());
}

pub fn test_pop_returns_items_in_lifo_order<R: TestResource>() {
    let mut list: ForwardList<Item, R> = new_list(2);
    list.push_front(1).unwrap();
    list.push_front(2).unwrap();
    list.push_front(3).unwrap();

    assert!(list.pop_front() == Some(3));
    assert!(list.pop_front() == Some(2));
    assert!(list.pop_front() == Some(1));
    assert!(list.pop_front() == None);
}

pub fn test_clear<R: TestResource>() {
    let mut list: ForwardList<Item, R> = new_list(4);
    list.clear();
    assert!(list.is_empty() && list.len() == 0);

    for value in 0..37 {
        list.push_front(value).unwrap();
    }
    list.clear();
    assert!(list.is_empty() && list.len() == 0);
    assert!(list.iter().next().is_none());
}

pub fn test_front_mut<R: TestResource>() {
    let mut list: ForwardList<Item, R> = new_list(4);
    assert!(list.front_mut().is_none());

    list.push_front(7).unwrap();
    *list.front_mut().unwrap() = 11;
    assert!(*list.front().unwrap() == 11);
}

pub fn fuzz_many_lists_few_mutations<R: TestResource>() {
    const NUM_LISTS_TO_FUZZ: usize = 10_000;
    const MAX_NUM_MUTATIONS: usize = 10;
    fuzz_many_item_lists::<R>(NUM_LISTS_TO_FUZZ, MAX_NUM_MUTATIONS);
}

pub fn fuzz_few_lists_many_mutations<R: TestResource>() {
    const NUM_LISTS_TO_FUZZ: usize = 100;
    const MAX_NUM_MUTATIONS: usize = 1000;
    fuzz_many_item_lists::<R>(NUM_LISTS_TO_FUZZ, MAX_NUM_MUTATIONS);
}

// The reference the fuzzer checks against: a Vec whose last element plays
// the part of the list's front.
struct Model {
    items: Vec<Item>,
}

impl Model {
    fn new() -> Self {
        return Self { items: Vec::new() }
    }

    fn push_front(&mut self, value: Item) {
        self.items.push(value);
    }

    fn pop_front(&mut self) -> Option<Item> {
        return self.items.pop()
    }

    fn front(&self) -> Option<&Item> {
        return self.items.last()
    }

    fn set_front(&mut self, value: Item) {
        *self.items.last_mut().unwrap() = value;
    }

    fn len(&self) -> usize {
        return self.items.len()
    }

    fn is_empty(&self) -> bool {
        return self.items.is_empty()
    }

    fn front_to_back(&self) -> Vec<Item> {
        return self.items.iter().rev().copied().collect()
    }
}

// Mutations
const PUSH_FRONT: usize = 0;
const POP_FRONT: usize = 1;
const SET_FRONT: usize = 2;
const NUM_MUTATIONS: usize = 3;

#[allow(dead_code)]
#[derive(Clone, Copy, Debug)]
enum LogEntry {
    Construction { blocks_per_chunk: usize },
    PushFront { value: Item },
    PopFront { popped: Option<Item> },
    SetFront { value: Item },
}

// Every mutation gets a random number of tokens per fuzzed list, so the
// push/pop balance differs from list to list.
struct MutationDeck {
    weighted: Vec<usize>, // one entry per token, holding the mutation it belongs to
}

impl MutationDeck {
    const MAX_TOKENS_PER_MUTATION: usize = 10;

    fn new<T: Rng>(rng: &mut T) -> Self {
        let mut weighted: Vec<usize> = Vec::new();
        for mutation in 0..NUM_MUTATIONS {
            let num_tokens: usize = rng.gen_range(1..=Self::MAX_TOKENS_PER_MUTATION);
            for _ in 0..num_tokens {
                weighted.push(mutation);
            }
        }

        assert!(!weighted.is_empty());
        return Self { weighted }
    }

    fn draw<T: Rng>(&self, rng: &mut T) -> usize {
        let index: usize = rng.gen_range(0..self.weighted.len());
        return self.weighted[index]
    }
}

#[derive(Debug)]
enum EqualityError {
    LensDontMatch,
    FrontsDontMatch,
    ItemsDontMatch,
}

fn compare_for_equality<R: BlockResource>(
    test: &ForwardList<Item, R>,
    model: &Model,
) -> Result<(), EqualityError> {
    if test.len() != model.len() || test.is_empty() != model.is_empty() {
        return Err(EqualityError::LensDontMatch)
    }

    if test.front() != model.front() {
        return Err(EqualityError::FrontsDontMatch)
    }

    let items_in_test: Vec<Item> = test.iter().copied().collect();
    if items_in_test != model.front_to_back() {
        return Err(EqualityError::ItemsDontMatch)
    }

    return Ok(())
}

fn fuzz<T: Rng, R: TestResource>(rng: &mut T, num_mutations_to_try: usize) {
    const MAX_NUM_ITEMS: usize = 100_000; // don't want to OoM
    const MAX_BLOCKS_PER_CHUNK: usize = 64;

    let mut log: Vec<LogEntry> = Vec::new();
    let blocks_per_chunk: usize = rng.gen_range(1..=MAX_BLOCKS_PER_CHUNK);
    let mut test: ForwardList<Item, R> = new_list(blocks_per_chunk);
    let mut model: Model = Model::new();
    log.push(LogEntry::Construction { blocks_per_chunk });

    if let Err(error) = compare_for_equality(&test, &model) {
        panic!("{:?}\n{:?}", error, log);
    }

    let deck: MutationDeck = MutationDeck::new(rng);
    for _ in 0..num_mutations_to_try {
        match deck.draw(rng) {
            PUSH_FRONT => {
                if model.len() >= MAX_NUM_ITEMS {
                    continue;
                }

                let value: Item = generate_random_item(rng);
                test.push_front(value).unwrap();
                model.push_front(value);
                log.push(LogEntry::PushFront { value });
            },

            POP_FRONT => {
                let popped: Option<Item> = test.pop_front();
                let expected: Option<Item> = model.pop_front();
                log.push(LogEntry::PopFront { popped });
                if popped != expected {
                    panic!("popped {:?}, expected {:?}\n{:?}", popped, expected, log);
                }
            },

            SET_FRONT => {
                if model.is_empty() {
                    continue;
                }

                let value: Item = generate_random_item(rng);
                *test.front_mut().unwrap() = value;
                model.set_front(value);
                log.push(LogEntry::SetFront { value });
            },

            _ => unreachable!(),
        }

        if let Err(error) = compare_for_equality(&test, &model) {
            panic!("{:?}\n{:?}", error, log);
        }
    }

    test.clear();
    assert!(test.is_empty() && test.len() == 0);
}

fn fuzz_many_item_lists<R: TestResource>(num_lists_to_fuzz: usize, max_num_mutations: usize) {
    /*
        Xoshiro256StarStar is deterministic and seeded from the same value on
        every run, so a failure here reproduces exactly: the same lists see
        the same mutation sequences every single time.
    */
    const RNG_SEED: u64 = 4621;
    let mut rng: Xoshiro256StarStar = Xoshiro256StarStar::seed_from_u64(RNG_SEED);

    for _ in 0..num_lists_to_fuzz {
        fuzz::<_, R>(&mut rng, max_num_mutations);
    }
}

fn generate_random_item<T: Rng>(rng: &mut T) -> Item {
    return rng.gen_range(Item::MIN..=Item::MAX)
}
