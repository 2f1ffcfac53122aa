//! 程序入口：解析启动参数、初始化日志、加载 Slint UI，并绑定 VM 回调

use std::{
    cell::RefCell,
    path::PathBuf,
    rc::Rc,
    sync::{Arc, Mutex},
    time::Instant,
};

use anyhow::Context;
use clap::Parser;
use slint::{ComponentHandle, ModelRc, SharedString, VecModel};
use tracing_subscriber::fmt::SubscriberBuilder;

use xml_tree_viewer::model::performance::run_performance_suite;
use xml_tree_viewer::utils::{clipboard, fs::read_xml_file_async};
use xml_tree_viewer::vm::bridge::*;
use xml_tree_viewer::{
    AppError, AppState, L8nError, L8nTable, Localizer, Section, ViewRow, ViewerConfig, XmlDocument,
};

slint::include_modules!();

#[derive(Parser, Debug)]
#[command(name = "xml_tree_viewer", version, about = "Collapsible tree viewer for XML files")]
struct Args {
    /// Localization region (default, zh-CN, de)
    #[arg(long, default_value = "default")]
    region: String,

    /// Show whitespace-only text segments
    #[arg(long)]
    keep_whitespace: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Run the built-in performance suite and exit
    #[arg(long)]
    bench: bool,

    /// XML file to open at startup
    file: Option<PathBuf>,
}

// TreeRowData转换实现
impl From<&ViewRow> for TreeRowData {
    /// 将Rust ViewRow转换为Slint可用的数据结构
    fn from(row: &ViewRow) -> Self {
        Self {
            kind: row.kind.as_str().into(),
            depth: row.depth as i32,
            label: row.label.clone().into(),
            // 单行显示，换行压成空格
            value: row.value.replace(['\r', '\n'], " ").into(),
            node_path: row.node_path.clone().into(),
            section: row.section.map(Section::as_str).unwrap_or_default().into(),
            expanded: row.expanded,
            toggleable: row.toggleable,
        }
    }
}

/// 后台加载结果暂存区：工作线程写入，UI线程在 load-finished 中取出
type PendingLoad = Arc<Mutex<Option<(PathBuf, Instant, Result<XmlDocument, AppError>)>>>;

/// VM桥接器：管理UI与数据层的交互
struct ViewModelBridge {
    app_state: Rc<RefCell<AppState>>,
    pending: PendingLoad,
}

impl ViewModelBridge {
    /// 创建新的VM桥接器并绑定所有回调
    fn new(app_window: &AppWindow, app_state: Rc<RefCell<AppState>>) -> Self {
        let bridge = Self {
            app_state,
            pending: Arc::new(Mutex::new(None)),
        };
        bridge.setup_callbacks(app_window);
        bridge
    }

    /// 设置所有UI回调函数
    fn setup_callbacks(&self, app_window: &AppWindow) {
        // === 加载文件回调 ===
        {
            let app_state = self.app_state.clone();
            let pending = self.pending.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_file(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_load_file(&app_window, &app_state, &pending);
                }
            });
        }

        // === 后台加载完成回调 ===
        {
            let app_state = self.app_state.clone();
            let pending = self.pending.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_load_finished(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_load_finished(&app_window, &app_state, &pending);
                }
            });
        }

        // === 区域展开/折叠回调 ===
        {
            let app_state = self.app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_toggle_section(move |node_path, section| {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_toggle_section(&app_window, &app_state, &node_path, &section);
                }
            });
        }

        // === 行选择回调 ===
        app_window.on_row_selected(|index| {
            tracing::debug!("选中行: {}", index);
        });

        // === 全部展开/折叠回调 ===
        {
            let app_state = self.app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_expand_all(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_set_all_expanded(&app_window, &app_state, true);
                }
            });
        }
        {
            let app_state = self.app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_collapse_all(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_set_all_expanded(&app_window, &app_state, false);
                }
            });
        }

        // === 复制节点回调 ===
        {
            let app_state = self.app_state.clone();
            let app_window_weak = app_window.as_weak();
            app_window.on_copy_pressed(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    Self::handle_copy_pressed(&app_window, &app_state);
                }
            });
        }
    }

    /// 初始化UI状态；缺少本地化键属于启动错误
    fn initialize_ui(&self, app_window: &AppWindow) -> Result<(), L8nError> {
        let state = self.app_state.borrow();
        let l8n = state.l8n();

        app_window.set_window_title(l8n.text(KEY_WINDOW_TITLE)?.into());
        app_window.set_open_button_text(l8n.text(KEY_OPEN_FILE)?.into());
        app_window.set_expand_all_text(l8n.text(KEY_EXPAND_ALL)?.into());
        app_window.set_collapse_all_text(l8n.text(KEY_COLLAPSE_ALL)?.into());
        app_window.set_copy_button_text(l8n.text(KEY_COPY_NODE)?.into());
        app_window.set_status_message(l8n.text(KEY_STATUS_READY)?.into());
        app_window.set_current_path("".into());
        app_window.set_loading(false);
        app_window.set_load_failed(false);
        app_window.set_error_text("".into());
        app_window.set_selected_row(-1);

        // 设置空的树模型
        let empty_model = ModelRc::new(VecModel::<TreeRowData>::default());
        app_window.set_tree_model(empty_model);
        Ok(())
    }

    /// 设置状态栏；本地化失败时显示错误本身而不是空白
    fn set_status(app_window: &AppWindow, message: Result<String, L8nError>) {
        match message {
            Ok(text) => app_window.set_status_message(text.into()),
            Err(e) => {
                tracing::error!("本地化失败: {}", e);
                app_window.set_status_message(e.to_string().into());
            }
        }
    }

    /// 显示文件选择对话框
    fn show_file_dialog(l8n: &Localizer) -> Option<PathBuf> {
        use rfd::FileDialog;

        let label = |key: &str| l8n.text(key).unwrap_or_else(|_| key.to_string());
        let file_path = FileDialog::new()
            .add_filter(label(KEY_FILTER_XML), XML_EXTENSIONS)
            .add_filter(label(KEY_FILTER_ALL), &["*"])
            .set_title(label(KEY_DIALOG_TITLE))
            .pick_file();

        match file_path {
            Some(path) => {
                tracing::info!("用户选择了文件: {}", path.display());
                Some(path)
            }
            None => {
                tracing::info!("用户取消了文件选择");
                None
            }
        }
    }

    /// 处理加载文件操作
    fn handle_load_file(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        pending: &PendingLoad,
    ) {
        if app_window.get_loading() {
            Self::set_status(app_window, app_state.borrow().l8n().text(KEY_STATUS_BUSY));
            return;
        }

        let file_path = Self::show_file_dialog(app_state.borrow().l8n());
        match file_path {
            Some(path) => Self::start_load(app_window, app_state, pending, path),
            None => Self::set_status(app_window, app_state.borrow().l8n().text(KEY_STATUS_NO_FILE)),
        }
    }

    /// 启动后台读取；结果经事件循环交回 load-finished
    fn start_load(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        pending: &PendingLoad,
        path: PathBuf,
    ) {
        app_window.set_loading(true);
        Self::set_status(app_window, status_loading(app_state.borrow().l8n(), &path));
        tracing::info!("开始加载: {}", path.display());

        let started = Instant::now();
        let slot = pending.clone();
        let app_window_weak = app_window.as_weak();
        let worker_path = path.clone();

        let spawned = read_xml_file_async(path.clone(), move |result| {
            if let Ok(mut guard) = slot.lock() {
                *guard = Some((worker_path, started, result));
            }
            let _ = slint::invoke_from_event_loop(move || {
                if let Some(app_window) = app_window_weak.upgrade() {
                    app_window.invoke_load_finished();
                }
            });
        });

        if let Err(e) = spawned {
            // 线程未启动：直接在当前线程应用失败结果
            if let Ok(mut guard) = pending.lock() {
                *guard = Some((path, started, Err(e)));
            }
            Self::handle_load_finished(app_window, app_state, pending);
        }
    }

    /// 在UI线程应用加载结果并刷新树
    fn handle_load_finished(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        pending: &PendingLoad,
    ) {
        let taken = pending.lock().ok().and_then(|mut guard| guard.take());
        let Some((path, started, result)) = taken else {
            tracing::warn!("加载完成回调触发，但没有待处理的结果");
            return;
        };

        app_window.set_loading(false);
        app_window.set_current_path(path.display().to_string().into());
        app_window.set_selected_row(-1);

        let outcome = app_state.borrow_mut().apply_load_result(&path, result);
        {
            let state = app_state.borrow();
            match outcome {
                Ok(()) => {
                    let elapsed = started.elapsed();
                    let count = state.view.as_ref().map(|v| v.element_count()).unwrap_or(0);
                    app_window.set_load_failed(false);
                    app_window.set_error_text("".into());
                    Self::set_status(app_window, status_loaded(state.l8n(), &path, count, elapsed));
                    tracing::info!("文件加载成功: {} 个元素，耗时: {}ms", count, elapsed.as_millis());
                }
                Err(e) => {
                    let message = state.load_error().map(str::to_string).unwrap_or_else(|| e.to_string());
                    app_window.set_load_failed(true);
                    app_window.set_error_text(message.clone().into());
                    app_window.set_status_message(message.into());
                }
            }
        }

        Self::rebuild_tree_model(app_window, app_state);
    }

    /// 处理区域标题点击
    fn handle_toggle_section(
        app_window: &AppWindow,
        app_state: &Rc<RefCell<AppState>>,
        node_path: &SharedString,
        section: &SharedString,
    ) {
        let Some(section) = Section::parse(section) else {
            tracing::warn!("未知区域: {}", section);
            return;
        };

        let start_time = Instant::now();
        let result = app_state.borrow_mut().toggle_section(node_path, section);
        match result {
            Ok(expanded) => {
                Self::rebuild_tree_model(app_window, app_state);
                let state = app_state.borrow();
                let node = state.node_name(node_path).unwrap_or_default();
                Self::set_status(app_window, status_toggled(state.l8n(), node, expanded));
                tracing::info!(
                    "切换 {} {}，耗时: {}ms",
                    node_path,
                    section.as_str(),
                    start_time.elapsed().as_millis()
                );
            }
            Err(e) => {
                tracing::warn!("切换失败: {}", e);
                Self::set_status(app_window, status_error(app_state.borrow().l8n(), &e.to_string()));
            }
        }
    }

    /// 处理全部展开/折叠
    fn handle_set_all_expanded(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>, expanded: bool) {
        let result = app_state.borrow_mut().set_all_expanded(expanded);
        if let Err(e) = result {
            Self::set_status(app_window, status_error(app_state.borrow().l8n(), &e.to_string()));
            return;
        }
        app_window.set_selected_row(-1);
        Self::rebuild_tree_model(app_window, app_state);

        let key = if expanded { KEY_STATUS_EXPANDED_ALL } else { KEY_STATUS_COLLAPSED_ALL };
        Self::set_status(app_window, app_state.borrow().l8n().text(key));
    }

    /// 处理复制按钮：复制选中行所属元素的原始XML
    fn handle_copy_pressed(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let state = app_state.borrow();
        let selected = app_window.get_selected_row();
        let rows = state.rows();

        let Some(row) = usize::try_from(selected).ok().and_then(|i| rows.get(i)) else {
            Self::set_status(app_window, state.l8n().text(KEY_STATUS_NOTHING_TO_COPY));
            return;
        };

        let copied = state
            .element_source(&row.node_path)
            .map_err(|e| e.to_string())
            .and_then(|source| clipboard::copy_to_clipboard(source).map_err(|e| e.to_string()));

        match copied {
            Ok(()) => {
                let node = state.node_name(&row.node_path).unwrap_or_default();
                Self::set_status(app_window, status_copied(state.l8n(), node));
            }
            Err(reason) => {
                tracing::error!("复制失败: {}", reason);
                Self::set_status(app_window, status_error(state.l8n(), &reason));
            }
        }
    }

    /// 根据当前展开状态重建列表模型
    fn rebuild_tree_model(app_window: &AppWindow, app_state: &Rc<RefCell<AppState>>) {
        let tree_data: Vec<TreeRowData> = app_state.borrow().rows().iter().map(TreeRowData::from).collect();
        let model = ModelRc::new(VecModel::from(tree_data));
        app_window.set_tree_model(model);
    }
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // 初始化日志输出
    let level = if args.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let _ = SubscriberBuilder::default().with_max_level(level).try_init();

    if args.bench {
        for r in run_performance_suite() {
            tracing::info!(
                "{}: {}ms [{}] {}",
                r.operation,
                r.duration_ms,
                if r.success { "ok" } else { "failed" },
                r.details
            );
        }
        return Ok(());
    }

    let table = L8nTable::builtin().context("加载内嵌字符串表失败")?;
    let config = ViewerConfig::default()
        .with_region(args.region)
        .with_whitespace_text(args.keep_whitespace);
    let state = Rc::new(RefCell::new(AppState::new(config, &table)?));

    let app = AppWindow::new().context("UI 初始化失败")?;

    // 创建VM桥接器并绑定UI回调
    let bridge = ViewModelBridge::new(&app, state.clone());
    bridge.initialize_ui(&app)?;

    if let Some(path) = args.file {
        ViewModelBridge::start_load(&app, &state, &bridge.pending, path);
    }

    tracing::info!("应用启动成功，UI已初始化");
    app.run().context("事件循环异常退出")?;
    Ok(())
}
