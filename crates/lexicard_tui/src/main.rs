use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use lexicard_core::*;
use lexicard_data::{config, Catalog, CatalogLoader, ALL_LEVELS};
use lexicard_engine::ExerciseRunner;
use log::{debug, info, warn};
use rand::rngs::ThreadRng;
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame, Terminal,
};
use std::io;
use std::sync::mpsc;
use std::time::{Duration, Instant};

const LEVEL_FILTERS: [Option<Level>; 4] = [
    None,
    Some(Level::Beginner),
    Some(Level::Intermediate),
    Some(Level::Advanced),
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum View {
    Browse,
    Training,
}

#[derive(Default)]
struct BrowseState {
    category: usize,
    level: usize,
    search: String,
    selected: usize,
    flipped: bool,
}

struct App {
    catalog: Catalog,
    runner: ExerciseRunner<ThreadRng>,
    event_rx: mpsc::Receiver<TrainingEvent>,
    rng: ThreadRng,
    view: View,
    browse: BrowseState,

    // 训练界面的临时输入
    option_cursor: usize,
    typed: String,
    feedback: Option<String>,
    final_summary: Option<SessionSummary>,
    status: Option<String>,

    last_frame: Instant,
}

impl App {
    fn new(catalog: Catalog, config: TrainingConfig) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        let runner = ExerciseRunner::new(config, rand::thread_rng(), Some(event_tx));

        Self {
            catalog,
            runner,
            event_rx,
            rng: rand::thread_rng(),
            view: View::Browse,
            browse: BrowseState::default(),
            option_cursor: 0,
            typed: String::new(),
            feedback: None,
            final_summary: None,
            status: None,
            last_frame: Instant::now(),
        }
    }

    fn filtered(&self) -> Vec<&VocabularyEntry> {
        let categories = self.catalog.categories();
        let category = categories.get(self.browse.category).copied();
        self.catalog.filter(
            category,
            LEVEL_FILTERS[self.browse.level],
            Some(self.browse.search.as_str()),
        )
    }

    fn selected_entry_id(&self) -> Option<u32> {
        self.filtered().get(self.browse.selected).map(|e| e.id)
    }

    /// 推进训练计时
    fn tick(&mut self) {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_frame);
        self.last_frame = now;

        self.runner.advance(elapsed);
        self.drain_events();
    }

    fn drain_events(&mut self) {
        while let Ok(event) = self.event_rx.try_recv() {
            match event {
                TrainingEvent::ExerciseStarted { .. } => {
                    self.option_cursor = 0;
                    self.typed.clear();
                    self.feedback = None;
                    self.status = None;
                }
                TrainingEvent::AnswerEvaluated {
                    correct,
                    correct_answer,
                    timed_out,
                    ..
                } => {
                    self.feedback = Some(if correct {
                        "✅ 正确！".to_string()
                    } else if timed_out {
                        format!("⏰ 时间到，正确答案：{}", correct_answer)
                    } else {
                        format!("❌ 错误，正确答案：{}", correct_answer)
                    });
                }
                TrainingEvent::ExerciseSkipped { .. } => {
                    self.feedback = Some("⏭ 已跳过".to_string());
                }
                TrainingEvent::SessionCompleted { summary } => {
                    self.final_summary = Some(summary);
                }
                TrainingEvent::Tick { .. } => {}
            }
        }
    }

    fn start_training(&mut self) {
        self.final_summary = None;
        self.last_frame = Instant::now();
        self.runner.restart(&self.catalog);
        self.view = View::Training;
        self.drain_events();
    }

    fn handle_key(&mut self, key: KeyEvent) -> bool {
        if key.kind != KeyEventKind::Press {
            return false;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return true; // 退出
        }

        let quit = match self.view {
            View::Browse => self.handle_browse_key(key),
            View::Training => {
                self.handle_training_key(key);
                false
            }
        };
        self.drain_events();
        quit
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        let visible = self.filtered().len();

        match key.code {
            KeyCode::Esc => return true,
            KeyCode::Up => {
                self.browse.selected = self.browse.selected.saturating_sub(1);
                self.browse.flipped = false;
            }
            KeyCode::Down => {
                if self.browse.selected + 1 < visible {
                    self.browse.selected += 1;
                }
                self.browse.flipped = false;
            }
            KeyCode::Tab => {
                let count = self.catalog.categories().len();
                self.browse.category = (self.browse.category + 1) % count;
                self.browse.selected = 0;
            }
            KeyCode::BackTab => {
                self.browse.level = (self.browse.level + 1) % LEVEL_FILTERS.len();
                self.browse.selected = 0;
            }
            KeyCode::Enter => self.browse.flipped = !self.browse.flipped,
            KeyCode::Char(c) if key.modifiers.contains(KeyModifiers::CONTROL) => match c {
                't' => {
                    if let Some(id) = self.selected_entry_id() {
                        self.catalog.toggle_learned(id);
                    }
                }
                'r' => match self.catalog.generate_random_entry(&mut self.rng) {
                    Ok(entry) => {
                        self.status =
                            Some(format!("🎲 新词条：{} ({})", entry.word, entry.translation));
                    }
                    Err(e) => {
                        warn!("⚠️ 无法生成随机词条: {}", e);
                        self.status = Some(format!("无法生成随机词条：{}", e));
                    }
                },
                's' => self.start_training(),
                _ => {}
            },
            KeyCode::Char(c) => {
                self.browse.search.push(c);
                self.browse.selected = 0;
                self.browse.flipped = false;
            }
            KeyCode::Backspace => {
                self.browse.search.pop();
                self.browse.selected = 0;
            }
            _ => {}
        }

        false
    }

    fn handle_training_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.runner.dispose();
                self.view = View::Browse;
                return;
            }
            KeyCode::Char('r') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.start_training();
                return;
            }
            _ => {}
        }

        match self.runner.phase() {
            Phase::Finished => {
                if key.code == KeyCode::Enter {
                    self.start_training();
                }
            }
            Phase::InProgress => self.handle_answer_key(key),
            Phase::Idle | Phase::ShowingResult => {}
        }
    }

    fn handle_answer_key(&mut self, key: KeyEvent) {
        let Some(exercise) = self.runner.current_exercise() else {
            return;
        };
        let options = exercise.options.clone();
        let has_options = exercise.kind.has_options();

        let result = match key.code {
            KeyCode::Tab => self.runner.skip(),
            KeyCode::Up if has_options => {
                self.option_cursor = self.option_cursor.saturating_sub(1);
                Ok(())
            }
            KeyCode::Down if has_options => {
                if self.option_cursor + 1 < options.len() {
                    self.option_cursor += 1;
                }
                Ok(())
            }
            KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => Ok(()),
            KeyCode::Char(c) if has_options => match c.to_digit(10) {
                Some(n) if n >= 1 && (n as usize) <= options.len() => {
                    self.option_cursor = n as usize - 1;
                    self.runner.select_option(&options[self.option_cursor])
                }
                _ => Ok(()),
            },
            KeyCode::Enter if has_options => match options.get(self.option_cursor) {
                Some(option) => self
                    .runner
                    .select_option(option)
                    .and_then(|_| self.runner.submit().map(|_| ())),
                None => Ok(()),
            },
            KeyCode::Char(c) => {
                self.typed.push(c);
                self.runner.type_answer(&self.typed)
            }
            KeyCode::Backspace => {
                self.typed.pop();
                self.runner.type_answer(&self.typed)
            }
            KeyCode::Enter => {
                if self.typed.trim().is_empty() {
                    self.status = Some("请输入答案后再提交".to_string());
                    Ok(())
                } else {
                    self.runner.submit().map(|_| ())
                }
            }
            _ => Ok(()),
        };

        if let Err(e) = result {
            debug!("输入被拒绝: {}", e);
            self.status = Some(e.to_string());
        }
    }

    fn render(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(2)
            .constraints([
                Constraint::Length(3), // Logo
                Constraint::Length(3), // 统计信息
                Constraint::Min(10),   // 主区域
                Constraint::Length(3), // 提示信息
            ])
            .split(frame.area());

        // Logo
        let logo = Paragraph::new("LEXICARD - 词卡")
            .style(
                Style::default()
                    .fg(Color::Cyan)
                    .add_modifier(Modifier::BOLD),
            )
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(logo, chunks[0]);

        match self.view {
            View::Browse => self.render_browse(frame, &chunks),
            View::Training => self.render_training(frame, &chunks),
        }
    }

    fn render_bar(frame: &mut Frame, area: Rect, text: String) {
        let bar = Paragraph::new(text)
            .style(Style::default().fg(Color::DarkGray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(bar, area);
    }

    fn render_browse(&self, frame: &mut Frame, chunks: &[Rect]) {
        let categories = self.catalog.categories();
        let level = LEVEL_FILTERS[self.browse.level].map_or(ALL_LEVELS, |l| l.as_str());
        Self::render_bar(
            frame,
            chunks[1],
            format!(
                "分类: {}  |  等级: {}  |  搜索: {}▏  |  已掌握: {}/{}",
                categories.get(self.browse.category).copied().unwrap_or_default(),
                level,
                self.browse.search,
                self.catalog.learned_count(),
                self.catalog.len()
            ),
        );

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(chunks[2]);

        let entries = self.filtered();
        let lines: Vec<Line> = entries
            .iter()
            .enumerate()
            .map(|(i, entry)| {
                let marker = if entry.learned { "✓" } else { " " };
                let text = format!("{} {}  [{}]", marker, entry.word, entry.category);
                let style = if i == self.browse.selected {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else if entry.learned {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default().fg(Color::White)
                };
                Line::from(Span::styled(text, style))
            })
            .collect();

        let list = Paragraph::new(lines).block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("词卡 ({})", entries.len()))
                .title_alignment(Alignment::Center),
        );
        frame.render_widget(list, columns[0]);

        let detail_lines = match entries.get(self.browse.selected) {
            Some(entry) if self.browse.flipped => vec![
                Line::from(Span::styled(
                    entry.translation.clone(),
                    Style::default()
                        .fg(Color::Green)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(""),
                Line::from(entry.example_translation.clone()),
            ],
            Some(entry) => vec![
                Line::from(Span::styled(
                    entry.word.clone(),
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD),
                )),
                Line::from(entry.pronunciation.clone()),
                Line::from(""),
                Line::from(entry.example.clone()),
                Line::from(""),
                Line::from(Span::styled(
                    format!("{} · 难度 {}", entry.level.as_str(), entry.difficulty),
                    Style::default().fg(Color::DarkGray),
                )),
            ],
            None => vec![Line::from("没有匹配的词条")],
        };

        let mut detail_lines = detail_lines;
        if let Some(status) = &self.status {
            detail_lines.push(Line::from(""));
            detail_lines.push(Line::from(Span::styled(
                status.clone(),
                Style::default().fg(Color::Yellow),
            )));
        }

        let detail = Paragraph::new(detail_lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("卡片")
                    .title_alignment(Alignment::Center),
            );
        frame.render_widget(detail, columns[1]);

        Self::render_bar(
            frame,
            chunks[3],
            "↑↓ 选择 | Enter 翻转 | Tab 分类 | Shift+Tab 等级 | Ctrl+T 已掌握 | Ctrl+R 随机词 | Ctrl+S 训练 | Esc 退出"
                .to_string(),
        );
    }

    fn render_training(&self, frame: &mut Frame, chunks: &[Rect]) {
        let snapshot = self.runner.snapshot();

        if snapshot.phase == Phase::Finished {
            Self::render_bar(frame, chunks[1], format!("得分: {}/{}", snapshot.score, snapshot.total_exercises));
            self.render_completion(frame, chunks[2]);
            Self::render_bar(frame, chunks[3], "Enter 再来一轮 | Esc 返回".to_string());
            return;
        }

        Self::render_bar(
            frame,
            chunks[1],
            format!(
                "题目: {}/{}  |  得分: {}  |  剩余: {}s",
                snapshot.current_exercise_index + 1,
                snapshot.total_exercises,
                snapshot.score,
                snapshot.seconds_remaining
            ),
        );

        let mut lines = Vec::new();
        if let Some(exercise) = &snapshot.current_exercise {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                exercise.prompt.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            )));
            if exercise.kind == ExerciseKind::Listening {
                let hint = exercise.entry.listening_hint().unwrap_or("……");
                lines.push(Line::from(Span::styled(
                    format!("🔊 {}", hint),
                    Style::default().fg(Color::Cyan),
                )));
            }
            lines.push(Line::from(""));

            if exercise.kind.has_options() {
                for (i, option) in exercise.options.iter().enumerate() {
                    lines.push(self.option_line(i, option, exercise, &snapshot));
                }
            } else {
                lines.push(Line::from(format!("> {}▏", self.typed)));
            }

            lines.push(Line::from(""));
            if let Some(feedback) = &self.feedback {
                let color = match snapshot.last_answer_correct {
                    Some(true) => Color::Green,
                    _ => Color::Red,
                };
                lines.push(Line::from(Span::styled(
                    feedback.clone(),
                    Style::default().fg(color).add_modifier(Modifier::BOLD),
                )));
            } else if let Some(status) = &self.status {
                lines.push(Line::from(Span::styled(
                    status.clone(),
                    Style::default().fg(Color::Yellow),
                )));
            }
        }

        let title = snapshot
            .current_exercise
            .as_ref()
            .map(|e| e.kind.as_str())
            .unwrap_or("练习");
        let practice_area = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(title)
                    .title_alignment(Alignment::Center),
            );
        frame.render_widget(practice_area, chunks[2]);

        Self::render_bar(
            frame,
            chunks[3],
            "↑↓/1-4 选择 | Enter 提交 | Tab 跳过 | Ctrl+R 重新开始 | Esc 返回".to_string(),
        );
    }

    fn option_line(
        &self,
        index: usize,
        option: &str,
        exercise: &Exercise,
        snapshot: &TrainingSnapshot,
    ) -> Line<'static> {
        let style = if snapshot.result_visible {
            if option == exercise.correct_answer {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if option == snapshot.pending_answer {
                Style::default().fg(Color::Red).add_modifier(Modifier::CROSSED_OUT)
            } else {
                Style::default().fg(Color::DarkGray)
            }
        } else if index == self.option_cursor {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::White)
        };

        Line::from(Span::styled(format!("{}. {}", index + 1, option), style))
    }

    fn render_completion(&self, frame: &mut Frame, area: Rect) {
        let Some(summary) = &self.final_summary else {
            return;
        };

        let mut lines = vec![
            Line::from(""),
            Line::from(Span::styled(
                "🎉 训练完成！",
                Style::default()
                    .fg(Color::Green)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
            Line::from(format!("得分：    {}/{}", summary.score, summary.total)),
            Line::from(format!("准确率：  {:.1}%", summary.accuracy() * 100.0)),
            Line::from(""),
        ];

        for outcome in &summary.outcomes {
            let word = self
                .catalog
                .get(outcome.entry_id)
                .map(|e| e.word.as_str())
                .unwrap_or("?");
            let mark = match outcome.resolution {
                Resolution::Skipped => "⏭",
                Resolution::TimedOut => "⏰",
                Resolution::Submitted if outcome.correct => "✓",
                Resolution::Submitted => "✗",
            };
            lines.push(Line::from(format!(
                "{} {}. {} ({}, {}s)",
                mark,
                outcome.exercise_id,
                word,
                outcome.kind.as_str(),
                outcome.seconds_spent
            )));
        }

        let completion = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .borders(Borders::ALL)
                .title("完成")
                .title_alignment(Alignment::Center),
        );
        frame.render_widget(completion, area);
    }
}

fn app_loop(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>, app: &mut App) -> Result<()> {
    loop {
        app.tick();
        terminal.draw(|f| app.render(f))?;

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key_event) = event::read()? {
                if app.handle_key(key_event) {
                    return Ok(());
                }
            }
        }
    }
}

fn run_app(catalog: Catalog, config: TrainingConfig) -> Result<()> {
    // 设置终端
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(catalog, config);
    let result = app_loop(&mut terminal, &mut app);
    app.runner.dispose();

    // 恢复终端
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = config::load_config(&config::default_config_path()?)?;
    let loader = CatalogLoader::new()?;
    let catalog = loader.load()?;
    info!(
        "📚 词库已加载: {} 个词条 (用户目录 {:?})",
        catalog.len(),
        loader.catalog_dir()
    );

    run_app(catalog, config)
}
