//! Test fixtures and helpers.
//!
//! A small hand-drawn map, a character catalog, a manual clock and a
//! [`TestWorld`] that wires them into a [`Game`] over a
//! [`MemoryRepository`].

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};

use slg_core::battle::{BattleJudge, BattleRequest, HeuristicJudge, Verdict};
use slg_core::catalog::{Character, CharacterCatalog, Skill};
use slg_core::clock::Clock;
use slg_core::error::{GameError, Result};
use slg_core::game::{Game, GameConfig};
use slg_core::map::{CityData, MapData, MapGraph, NodeType};
use slg_core::model::{BaseCity, Player};
use slg_core::repository::{MemoryRepository, Repository};
use slg_core::resources::Resources;

/// Start time of every fixture: 2023-11-14 22:13:20 UTC.
pub const START: i64 = 1_700_000_000;

/// Seconds per minute.
pub const MINUTE: i64 = 60;

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    /// A clock frozen at `now`.
    #[must_use]
    pub fn new(now: i64) -> Self {
        Self {
            now: AtomicI64::new(now),
        }
    }

    /// Jump to `now`.
    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    /// Move forward by `secs`.
    pub fn advance(&self, secs: i64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    /// Move forward by whole minutes.
    pub fn advance_minutes(&self, minutes: i64) {
        self.advance(minutes * MINUTE);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

fn city(
    province: &str,
    pos: (i32, i32),
    level: Option<u8>,
    lines: &[(&str, &str)],
) -> CityData {
    CityData {
        province: province.to_string(),
        node_type: NodeType::City,
        capital: false,
        pos,
        lines: lines
            .iter()
            .map(|(gate, target)| ((*gate).to_string(), (*target).to_string()))
            .collect::<BTreeMap<_, _>>(),
        level,
    }
}

/// Map data for [`sample_map`].
///
/// ```text
/// 成都 - 汉中 - 长安 - 洛阳 - 邺城 - 南皮
///   |                 |  \
/// 江州 - 江陵 - 襄阳 --+   陈留 - 濮阳
///                          |
///                        寿春 - 建业
/// ```
///
/// 夷州 has no roads. 洛阳 is level 2, 襄阳 level 3 and 长安 carries an
/// out-of-range level 9.
#[must_use]
pub fn sample_map_data() -> MapData {
    let mut cities = BTreeMap::new();
    cities.insert("成都".into(), city("益", (100, 400), None, &[("北门", "汉中"), ("东门", "江州")]));
    cities.insert("汉中".into(), city("益", (150, 300), None, &[("北门", "长安")]));
    cities.insert("江州".into(), city("益", (200, 420), None, &[("东门", "江陵")]));
    cities.insert("长安".into(), city("司", (200, 250), Some(9), &[("东门", "洛阳")]));
    cities.insert(
        "洛阳".into(),
        city("司", (300, 250), Some(2), &[("北门", "邺城"), ("东门", "陈留"), ("南门", "襄阳")]),
    );
    cities.insert("邺城".into(), city("冀", (320, 150), None, &[("东门", "南皮")]));
    cities.insert("南皮".into(), city("冀", (400, 120), None, &[]));
    cities.insert("陈留".into(), city("兖", (380, 260), None, &[("北门", "濮阳"), ("南门", "寿春")]));
    cities.insert("濮阳".into(), city("兖", (400, 200), None, &[]));
    cities.insert("寿春".into(), city("扬", (420, 330), None, &[("东门", "建业")]));
    cities.insert("建业".into(), city("扬", (500, 360), None, &[]));
    cities.insert("江陵".into(), city("荆", (280, 400), None, &[("北门", "襄阳")]));
    cities.insert("襄阳".into(), city("荆", (290, 330), Some(3), &[]));
    cities.insert("夷州".into(), city("扬", (600, 500), None, &[]));
    if let Some(chengdu) = cities.get_mut("成都") {
        chengdu.capital = true;
    }
    MapData { cities }
}

/// The fixture map as a graph.
#[must_use]
pub fn sample_map() -> MapGraph {
    MapGraph::from_data(sample_map_data()).expect("fixture map is valid")
}

fn character(name: &str, title: &str, skills: &[(&str, &str)]) -> Character {
    Character {
        name: name.to_string(),
        title: title.to_string(),
        background: String::new(),
        skills: skills
            .iter()
            .map(|(name, description)| Skill {
                name: (*name).to_string(),
                description: (*description).to_string(),
            })
            .collect(),
    }
}

/// Names in [`sample_catalog`], in catalog order.
pub const SAMPLE_CHARACTERS: [&str; 8] = [
    "关羽", "张飞", "赵云", "诸葛亮", "曹操", "吕布", "周瑜", "孙尚香",
];

/// Eight characters with keyword-bearing skills.
#[must_use]
pub fn sample_catalog() -> CharacterCatalog {
    CharacterCatalog::new(vec![
        character("关羽", "武圣", &[("威震华夏", "重击敌军并震慑周围部队")]),
        character("张飞", "万人敌", &[("当阳怒吼", "嘲讽并眩晕敌军")]),
        character("赵云", "常胜将军", &[("七进七出", "突进冲锋，闪避攻击")]),
        character("诸葛亮", "卧龙", &[("八阵图", "扰乱敌军并减速"), ("木牛流马", "补给粮草")]),
        character("曹操", "魏武", &[("挟天子", "号令全军，鼓舞士气")]),
        character("吕布", "飞将", &[("无双", "范围伤害，暴击连击")]),
        character("周瑜", "美周郎", &[("赤壁", "火焰范围伤害")]),
        character("孙尚香", "弓腰姬", &[("结姻", "治疗并提供护盾")]),
    ])
    .expect("fixture catalog is valid")
}

/// Judge with a canned answer, recording every request it sees.
#[derive(Debug, Default)]
pub struct ScriptedJudge {
    verdict: Option<Verdict>,
    seen: Mutex<Vec<BattleRequest>>,
}

impl ScriptedJudge {
    /// Always answer `verdict`, valid or not.
    #[must_use]
    pub fn answering(verdict: Verdict) -> Self {
        Self {
            verdict: Some(verdict),
            seen: Mutex::new(Vec::new()),
        }
    }

    /// Always fail as unavailable.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Requests received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<BattleRequest> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

impl BattleJudge for ScriptedJudge {
    fn judge(&self, request: &BattleRequest) -> Result<Verdict> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        self.verdict
            .clone()
            .ok_or_else(|| GameError::JudgeUnavailable("scripted outage".into()))
    }
}

/// A game over the fixture map and catalog with a manual clock.
pub struct TestWorld {
    /// Shared repository.
    pub repo: Arc<MemoryRepository>,
    /// Clock driving every engine.
    pub clock: Arc<ManualClock>,
    /// The game.
    pub game: Game<MemoryRepository>,
}

impl Default for TestWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl TestWorld {
    /// Default balance, seed 42, offline judge.
    #[must_use]
    pub fn new() -> Self {
        Self::build(
            GameConfig {
                seed: Some(42),
                ..GameConfig::default()
            },
            Arc::new(HeuristicJudge),
        )
    }

    /// Custom configuration.
    #[must_use]
    pub fn with_config(config: GameConfig) -> Self {
        Self::build(config, Arc::new(HeuristicJudge))
    }

    /// Custom battle judge.
    #[must_use]
    pub fn with_judge(judge: Arc<dyn BattleJudge>) -> Self {
        Self::build(
            GameConfig {
                seed: Some(42),
                ..GameConfig::default()
            },
            judge,
        )
    }

    fn build(config: GameConfig, judge: Arc<dyn BattleJudge>) -> Self {
        let repo = Arc::new(MemoryRepository::new());
        let clock = Arc::new(ManualClock::new(START));
        let game = Game::with_parts(
            Arc::clone(&repo),
            Arc::new(sample_map()),
            Arc::new(sample_catalog()),
            config,
            Arc::clone(&clock) as Arc<dyn Clock>,
            judge,
        )
        .expect("fixture game builds");
        Self { repo, clock, game }
    }

    /// Register `user_id` with its id as nickname.
    pub fn register(&self, user_id: &str) -> Player {
        self.game
            .register(user_id, user_id)
            .expect("registration succeeds")
    }

    /// Stored player record.
    #[must_use]
    pub fn player(&self, user_id: &str) -> Player {
        self.repo
            .player(user_id)
            .expect("repository readable")
            .expect("player registered")
    }

    /// Overwrite a player's balances.
    pub fn fund(&self, user_id: &str, resources: Resources) {
        let mut player = self.player(user_id);
        player.resources = resources;
        self.repo.upsert_player(&player).expect("player stored");
    }

    /// Grant characters at level 1.
    pub fn give_characters(&self, user_id: &str, names: &[&str]) {
        for name in names {
            self.repo
                .add_character(user_id, name, 1, self.clock.now())
                .expect("character stored");
        }
    }

    /// Set a character's level directly.
    pub fn set_level(&self, user_id: &str, name: &str, level: u8) {
        self.repo
            .set_character_level(user_id, name, level)
            .expect("level stored");
    }

    /// Put a player's base in `city` without migration rules.
    pub fn place_base(&self, user_id: &str, city: &str) {
        let (x, y) = self.game.map().position(city).expect("fixture city");
        let mut player = self.player(user_id);
        player.base = Some(BaseCity {
            city: city.to_string(),
            x,
            y,
        });
        self.repo.upsert_player(&player).expect("player stored");
    }
}

/// Resources with the same amount of everything.
#[must_use]
pub fn uniform(amount: u64) -> Resources {
    Resources {
        grain: amount,
        gold: amount,
        stone: amount,
        troops: amount,
    }
}
